//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Narrowing applied to post listings. Filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQueryFilter {
    pub group_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Only posts whose author is followed by this user.
    pub followed_by: Option<Uuid>,
    /// Case-insensitive substring of the post text.
    pub search: Option<String>,
}

impl PostQueryFilter {
    pub fn group(group_id: Uuid) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn followed_by(user_id: Uuid) -> Self {
        Self {
            followed_by: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// Edits never touch `pub_date` or the author. A `None` image keeps the
/// stored one.
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateGroupParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    /// Removes the user together with their posts, comments and follow edges.
    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn list_groups(&self, search: Option<&str>) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;
}

#[async_trait]
pub trait GroupsWriteRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;

    async fn update_group(&self, params: UpdateGroupParams) -> Result<GroupRecord, RepoError>;

    /// Removes the group; referencing posts keep existing without a group.
    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts matching `filter`, newest `pub_date` first.
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn set_post_group(
        &self,
        id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<PostRecord, RepoError>;

    /// Removes the post and its comments.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Inserts the edge unless it already exists. Returns whether a row was added.
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Returns whether an edge was removed.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError>;

    async fn count_following(&self, user_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
