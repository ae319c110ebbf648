use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::{
    groups::AdminGroupError, posts::AdminPostError, users::AdminUserError,
};
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const VALIDATION: &str = "validation_error";
    pub const CONSTRAINT: &str = "constraint_violation";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const CACHE_DISABLED: &str = "cache_disabled";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    fn validation(message: &'static str, hint: impl ToString) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            message,
            Some(hint.to_string()),
        )
    }

    fn conflict(message: &'static str, hint: impl ToString) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            codes::CONSTRAINT,
            message,
            Some(hint.to_string()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::admin",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => {
            ApiError::conflict("Duplicate record", constraint)
        }
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

pub(crate) fn group_to_api(err: AdminGroupError) -> ApiError {
    match err {
        AdminGroupError::Validation(err) => ApiError::validation("Invalid group", err),
        AdminGroupError::Slug(err) => ApiError::validation("Invalid group slug", err),
        AdminGroupError::ConstraintViolation(slug) => {
            ApiError::conflict("Group slug already taken", slug)
        }
        AdminGroupError::NotFound => ApiError::not_found("group not found"),
        AdminGroupError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn post_to_api(err: AdminPostError) -> ApiError {
    match err {
        AdminPostError::NotFound => ApiError::not_found("post not found"),
        AdminPostError::UnknownGroup(slug) => ApiError::validation("Unknown group", slug),
        AdminPostError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn user_to_api(err: AdminUserError) -> ApiError {
    match err {
        AdminUserError::Validation(err) => ApiError::validation("Invalid username", err),
        AdminUserError::ConstraintViolation(username) => {
            ApiError::conflict("Username already taken", username)
        }
        AdminUserError::NotFound => ApiError::not_found("user not found"),
        AdminUserError::Repo(repo) => repo_to_api(repo),
    }
}
