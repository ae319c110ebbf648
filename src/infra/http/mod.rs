mod admin;
mod auth;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use auth::{AuthContext, CurrentUser, Viewer};
pub use public::{HttpState, build_router};

use crate::application::error::{ErrorReport, HttpError};
use crate::application::repos::RepoError;
use axum::http::{HeaderValue, StatusCode, header::LOCATION};
use axum::response::{IntoResponse, Response};

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// `302 Found` pointing at `location`.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(err) => HttpError::from_error(
            "infra::http::found",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid redirect target",
            &err,
        )
        .into_response(),
    }
}
