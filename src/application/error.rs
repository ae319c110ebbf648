use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{feed::FeedError, follows::FollowError, posts::PostError, repos::RepoError},
    infra::error::InfraError,
};

/// Diagnostic attached to failed responses and picked up by the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

fn repo_http_error(source: &'static str, err: &RepoError) -> HttpError {
    let status = match err {
        RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpError::from_error(source, status, "Internal server error", err)
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::error::feed_error_to_http_error";
        match &error {
            FeedError::UnknownGroup(_) => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Unknown group", &error)
            }
            FeedError::UnknownAuthor(_) => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Unknown author", &error)
            }
            FeedError::Repo(err) => repo_http_error(SOURCE, err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        const SOURCE: &str = "application::error::post_error_to_http_error";
        match &error {
            PostError::Validation(_) | PostError::UnknownGroup(_) | PostError::Image(_) => {
                HttpError::from_error(SOURCE, StatusCode::BAD_REQUEST, "Invalid post", &error)
            }
            PostError::NotFound => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Post not found", &error)
            }
            PostError::Forbidden => HttpError::from_error(
                SOURCE,
                StatusCode::FORBIDDEN,
                "Only the author may change this post",
                &error,
            ),
            PostError::Storage(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store image",
                &error,
            ),
            PostError::Repo(err) => repo_http_error(SOURCE, err),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        const SOURCE: &str = "application::error::follow_error_to_http_error";
        match &error {
            FollowError::SelfFollow => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "You cannot follow yourself",
                &error,
            ),
            FollowError::UnknownAuthor(_) => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Unknown author", &error)
            }
            FollowError::Repo(err) => repo_http_error(SOURCE, err),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
