use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::users::validate_username;

#[derive(Debug, Error)]
pub enum AdminUserError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("username `{0}` is already taken")]
    ConstraintViolation(String),
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AdminUserService {
    users: Arc<dyn UsersRepo>,
}

impl AdminUserService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn register(&self, username: &str) -> Result<UserRecord, AdminUserError> {
        let username = validate_username(username)?;
        let user = self
            .users
            .create_user(&username)
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AdminUserError::ConstraintViolation(username),
                other => AdminUserError::Repo(other),
            })?;

        info!(target = "murmur::admin::users", username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn find(&self, username: &str) -> Result<UserRecord, AdminUserError> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or(AdminUserError::NotFound)
    }

    /// Remove the user along with their posts, comments and follow edges.
    pub async fn delete(&self, username: &str) -> Result<(), AdminUserError> {
        let user = self.find(username).await?;
        self.users.delete_user(user.id).await.map_err(|err| match err {
            RepoError::NotFound => AdminUserError::NotFound,
            other => AdminUserError::Repo(other),
        })?;

        info!(target = "murmur::admin::users", username = %username, "user deleted");
        Ok(())
    }
}
