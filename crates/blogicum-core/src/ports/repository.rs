use async_trait::async_trait;

use crate::domain::{Category, Comment, CommentView, Id, Location, Post, PostSummary, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};
use crate::policy::PostQuery;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity. Unsaved entities are inserted and come back with
    /// their new id; stored ones are updated.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Id> {
    /// Find a user by their (unique) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Id> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// Every category, ordered by title. Feeds the post form.
    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Id> {
    /// Published locations, ordered by name. Feeds the post form.
    async fn list_published(&self) -> Result<Vec<Location>, RepoError>;

    /// Every location, ordered by name.
    async fn list_all(&self) -> Result<Vec<Location>, RepoError>;
}

/// Post repository. Listings apply the visibility rule carried by the query.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Id> {
    /// Load a post together with its author, category, location and comment
    /// count. No visibility filtering happens here.
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError>;

    /// One page of posts matching `query`, newest `pub_date` first.
    async fn list(&self, query: &PostQuery, page: PageRequest)
    -> Result<Page<PostSummary>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Id> {
    /// All comments of a post, oldest first.
    async fn list_for_post(&self, post_id: Id) -> Result<Vec<CommentView>, RepoError>;
}
