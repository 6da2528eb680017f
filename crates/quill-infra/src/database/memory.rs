//! In-memory repositories - used by tests and when no database is configured.
//!
//! Note: data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, Role, User};
use quill_core::error::RepoError;
use quill_core::pagination::{PageRequest, window};
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};
use quill_core::query::PostQuery;

/// Users keyed by id, with email uniqueness enforced on write.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(store: &HashMap<Uuid, User>, user: &User) -> bool {
    store
        .values()
        .any(|other| other.id != user.id && other.email == user.email)
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&user.id) || email_taken(&store, &user) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if !store.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if email_taken(&store, &user) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, RepoError> {
        let needle = fragment.to_lowercase();
        let store = self.store.read().await;
        Ok(store
            .values()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .map(|u| u.id)
            .collect())
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().filter(|u| u.role == role).count() as u64)
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), RepoError> {
        let mut users: Vec<User> = self.store.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = users.len() as u64;
        Ok((window(users, page), total))
    }
}

/// Posts keyed by id, with slug uniqueness enforced on write.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) || store.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint("blogs_slug_key".to_string()));
        }
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        match store.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|p| p.slug == slug).cloned())
    }

    async fn search(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let mut posts: Vec<Post> = self
            .store
            .read()
            .await
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| query.sort.compare(a, b));
        let total = posts.len() as u64;
        Ok((window(posts, page), total))
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let post = store.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(post.views)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, p| p.author_id != author_id);
        Ok((before - store.len()) as u64)
    }
}
