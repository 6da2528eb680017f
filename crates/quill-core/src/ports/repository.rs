use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, Role, User};
use crate::error::RepoError;
use crate::pagination::PageRequest;
use crate::query::PostQuery;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity. Unique-field clashes are `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. A missing row is `RepoError::NotFound`.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User directory storage.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    /// Ids of users whose name contains `fragment`, case-insensitively.
    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, RepoError>;

    async fn count_by_role(&self, role: Role) -> Result<u64, RepoError>;

    /// Newest first.
    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), RepoError>;
}

/// Blog post storage.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Filtered, sorted page of posts together with the total match count.
    async fn search(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError>;

    /// Atomically bump the view counter, returning the new value.
    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError>;

    /// Remove every post written by `author_id`, returning how many went.
    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}
