//! Blog store operations.
//!
//! Every entry point loads what it needs, consults the policy, then applies
//! the lifecycle or a plain field update before persisting.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::post::{
    normalize_category, normalize_tags, validate_comment, validate_content, validate_excerpt,
    validate_title,
};
use crate::domain::{Comment, Post, PostStatus, User};
use crate::error::{DomainError, RepoError};
use crate::lifecycle::{self, TransitionPath};
use crate::pagination::{Page, PageRequest};
use crate::policy::{Action, Actor, Resource, authorize};
use crate::ports::{PostRepository, UserRepository};
use crate::query::{PostQuery, PostSort};

/// Input for a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub status: Option<PostStatus>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
}

/// The fields an update may touch. Unset fields stay as they are.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.excerpt.is_none()
    }
}

/// Listing parameters as the caller supplied them.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: PageRequest,
    pub status: Option<PostStatus>,
    pub author: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: PostSort,
}

/// Users referenced by a set of posts, keyed by id.
///
/// Authors or commenters that no longer exist are simply absent.
#[derive(Debug, Clone, Default)]
pub struct UserLookup(HashMap<Uuid, User>);

impl UserLookup {
    pub fn get(&self, id: Uuid) -> Option<&User> {
        self.0.get(&id)
    }
}

impl FromIterator<User> for UserLookup {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self(iter.into_iter().map(|u| (u.id, u)).collect())
    }
}

/// A post together with the users it references.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub users: UserLookup,
}

#[derive(Debug, Clone)]
pub struct PostListing {
    pub page: Page<Post>,
    pub users: UserLookup,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
}

/// Comment thread after an append.
#[derive(Debug, Clone)]
pub struct CommentThread {
    pub comments: Vec<Comment>,
    pub users: UserLookup,
}

/// How a post deletion was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedBy {
    Author,
    Admin,
}

pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl BlogService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Filtered listing. Only admins see non-published posts.
    pub async fn list(&self, actor: &Actor, params: ListParams) -> Result<PostListing, DomainError> {
        authorize(actor, &Resource::Posts, Action::List)?;

        let status = if actor.is_admin() {
            params.status
        } else {
            Some(PostStatus::Published)
        };
        let author_ids = match params.author {
            Some(name) => Some(self.users.find_ids_by_name(&name).await?),
            None => None,
        };
        let query = PostQuery {
            status,
            author_ids,
            search: params.search,
            category: params.category,
            tag: params.tag,
            sort: params.sort,
        };
        self.run_query(&query, params.page).await
    }

    /// The caller's own posts, newest first.
    pub async fn my_blogs(
        &self,
        caller: &User,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<PostListing, DomainError> {
        authorize(&Actor::from(caller), &Resource::Posts, Action::List)?;
        let query = PostQuery {
            status,
            ..PostQuery::by_author(caller.id)
        };
        self.run_query(&query, page).await
    }

    /// Published-only lookup by slug. Anything else reads as missing.
    pub async fn get_public(&self, slug: &str) -> Result<PostView, DomainError> {
        self.read_by_slug(&Actor::Anonymous, slug).await
    }

    /// Lookup by slug on behalf of `actor`, with ownership checks for
    /// unpublished posts.
    pub async fn get_by_slug(&self, actor: &Actor, slug: &str) -> Result<PostView, DomainError> {
        self.read_by_slug(actor, slug).await
    }

    pub async fn create(&self, caller: &User, input: NewPost) -> Result<PostView, DomainError> {
        authorize(&Actor::from(caller), &Resource::Posts, Action::Create)?;

        let title = validate_title(&input.title)?;
        let content = validate_content(&input.content)?;
        let excerpt = input
            .excerpt
            .as_deref()
            .map(validate_excerpt)
            .transpose()?;
        let status = match input.status {
            None | Some(PostStatus::Draft) => PostStatus::Draft,
            Some(PostStatus::Published) => PostStatus::Published,
            Some(PostStatus::Archived) => {
                return Err(DomainError::validation(
                    "Status must be draft or published",
                ));
            }
        };

        let mut post = Post::new(
            caller.id,
            title,
            content,
            excerpt,
            normalize_tags(&input.tags),
            normalize_category(input.category.as_deref()),
        );
        let now = post.created_at;
        lifecycle::transition(&mut post, status, TransitionPath::Standard, now)?;

        let post = self.posts.insert(post).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                DomainError::Conflict("Blog with this title already exists".to_string())
            }
            other => other.into(),
        })?;
        tracing::info!(post_id = %post.id, author_id = %caller.id, status = %post.status, "Blog created");
        self.with_users(post).await
    }

    /// Partial update by the author or an admin. Status changes follow the
    /// forward-only lifecycle; the slug never changes.
    pub async fn update(
        &self,
        caller: &User,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<PostView, DomainError> {
        let mut post = self.load(id).await?;
        authorize(
            &Actor::from(caller),
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Update,
        )?;
        if changes.is_empty() {
            return self.with_users(post).await;
        }

        let now = Utc::now();
        if let Some(title) = changes.title {
            post.title = validate_title(&title)?;
        }
        if let Some(excerpt) = changes.excerpt {
            post.excerpt = validate_excerpt(&excerpt)?;
        }
        if let Some(content) = changes.content {
            post.set_content(validate_content(&content)?);
        }
        if let Some(tags) = changes.tags {
            post.tags = normalize_tags(&tags);
        }
        if let Some(category) = changes.category {
            post.category = normalize_category(Some(&category));
        }
        if let Some(status) = changes.status {
            lifecycle::transition(&mut post, status, TransitionPath::Standard, now)?;
        }
        post.updated_at = now;

        let post = self.posts.update(post).await?;
        tracing::info!(post_id = %post.id, by = %caller.id, "Blog updated");
        self.with_users(post).await
    }

    /// Moderation: set any status directly.
    pub async fn set_status(
        &self,
        caller: &User,
        id: Uuid,
        status: PostStatus,
    ) -> Result<PostView, DomainError> {
        let mut post = self.load(id).await?;
        authorize(
            &Actor::from(caller),
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Moderate,
        )?;

        if lifecycle::transition(&mut post, status, TransitionPath::Moderation, Utc::now())? {
            post = self.posts.update(post).await?;
            tracing::info!(post_id = %post.id, status = %status, by = %caller.id, "Blog status moderated");
        }
        self.with_users(post).await
    }

    pub async fn delete(&self, caller: &User, id: Uuid) -> Result<DeletedBy, DomainError> {
        let post = self.load(id).await?;
        let actor = Actor::from(caller);
        authorize(
            &actor,
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Delete,
        )?;

        self.posts.delete(id).await?;
        let deleted_by = if post.author_id == caller.id {
            DeletedBy::Author
        } else {
            DeletedBy::Admin
        };
        tracing::info!(post_id = %id, by = %caller.id, ?deleted_by, "Blog deleted");
        Ok(deleted_by)
    }

    pub async fn add_comment(
        &self,
        caller: &User,
        id: Uuid,
        content: &str,
    ) -> Result<CommentThread, DomainError> {
        let mut post = self.load(id).await?;
        authorize(
            &Actor::from(caller),
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Comment,
        )?;

        lifecycle::ensure_commentable(&post)?;
        let content = validate_comment(content)?;
        lifecycle::add_comment(&mut post, caller.id, content, Utc::now())?;

        let post = self.posts.update(post).await?;
        tracing::debug!(post_id = %post.id, by = %caller.id, "Comment added");

        let ids: Vec<Uuid> = post.comments.iter().map(|c| c.user_id).collect();
        let users = self.lookup(ids).await?;
        Ok(CommentThread {
            comments: post.comments,
            users,
        })
    }

    pub async fn toggle_like(&self, caller: &User, id: Uuid) -> Result<LikeOutcome, DomainError> {
        let mut post = self.load(id).await?;
        authorize(
            &Actor::from(caller),
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Like,
        )?;

        let liked = lifecycle::toggle_like(&mut post, caller.id, Utc::now());
        let post = self.posts.update(post).await?;
        tracing::debug!(post_id = %post.id, by = %caller.id, liked, "Like toggled");
        Ok(LikeOutcome {
            liked,
            like_count: post.like_count(),
        })
    }

    async fn read_by_slug(&self, actor: &Actor, slug: &str) -> Result<PostView, DomainError> {
        let mut post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Blog"))?;
        authorize(
            actor,
            &Resource::Post {
                author_id: post.author_id,
                status: post.status,
            },
            Action::Read,
        )?;

        if lifecycle::counts_view(&post) {
            post.views = self.posts.increment_views(post.id).await?;
        }
        self.with_users(post).await
    }

    async fn run_query(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<PostListing, DomainError> {
        let page = page.clamped();
        if query.matches_nothing() {
            return Ok(PostListing {
                page: Page::empty(page),
                users: UserLookup::default(),
            });
        }

        let (posts, total) = self.posts.search(query, page).await?;
        let users = self.lookup(posts.iter().map(|p| p.author_id).collect()).await?;
        Ok(PostListing {
            page: Page::new(posts, total, page),
            users,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Blog"))
    }

    async fn with_users(&self, post: Post) -> Result<PostView, DomainError> {
        let mut ids: Vec<Uuid> = post.comments.iter().map(|c| c.user_id).collect();
        ids.push(post.author_id);
        let users = self.lookup(ids).await?;
        Ok(PostView { post, users })
    }

    async fn lookup(&self, mut ids: Vec<Uuid>) -> Result<UserLookup, DomainError> {
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(UserLookup::default());
        }
        Ok(self.users.find_by_ids(&ids).await?.into_iter().collect())
    }
}
