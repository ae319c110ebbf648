use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("users cannot follow themselves")]
    SelfFollow,
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Subscribe `user_id` to `author_username`. Repeating a follow is a no-op.
    pub async fn follow(
        &self,
        user_id: Uuid,
        author_username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self
            .users
            .find_user_by_username(author_username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(author_username.to_string()))?;

        if author.id == user_id {
            return Err(FollowError::SelfFollow);
        }

        if self.follows.create_follow(user_id, author.id).await? {
            info!(
                target = "murmur::follows",
                user_id = %user_id,
                author = %author.username,
                "follow created"
            );
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Drop the edge if present. Unknown authors and missing edges are no-ops.
    pub async fn unfollow(
        &self,
        user_id: Uuid,
        author_username: &str,
    ) -> Result<UnfollowOutcome, FollowError> {
        let Some(author) = self.users.find_user_by_username(author_username).await? else {
            return Ok(UnfollowOutcome::NotFollowing);
        };

        if self.follows.delete_follow(user_id, author.id).await? {
            info!(
                target = "murmur::follows",
                user_id = %user_id,
                author = %author.username,
                "follow removed"
            );
            Ok(UnfollowOutcome::Removed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    pub async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, FollowError> {
        if user_id == author_id {
            return Ok(false);
        }
        self.follows
            .follow_exists(user_id, author_id)
            .await
            .map_err(FollowError::from)
    }

    pub async fn following_count(&self, user_id: Uuid) -> Result<u64, FollowError> {
        self.follows
            .count_following(user_id)
            .await
            .map_err(FollowError::from)
    }
}
