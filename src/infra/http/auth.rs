//! Request identity resolved from the header set by the fronting proxy.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::application::error::HttpError;
use crate::application::repos::UsersRepo;
use crate::config::AuthSettings;
use crate::domain::entities::UserRecord;

use super::found;

#[derive(Clone)]
pub struct AuthContext {
    pub users: Arc<dyn UsersRepo>,
    pub settings: AuthSettings,
}

impl AuthContext {
    async fn resolve(&self, parts: &Parts) -> Result<Option<UserRecord>, HttpError> {
        let Some(username) = parts
            .headers
            .get(&self.settings.user_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        self.users
            .find_user_by_username(username)
            .await
            .map_err(|err| {
                HttpError::from_error(
                    "infra::http::auth::resolve",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to resolve the current user",
                    &err,
                )
            })
    }

    /// `login_url?next=<path>` for the request being turned away.
    pub fn login_redirect(&self, parts: &Parts) -> Response {
        let next = parts
            .uri
            .path_and_query()
            .map(|value| value.as_str())
            .unwrap_or("/");
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("next", next)
            .finish();
        let separator = if self.settings.login_url.contains('?') {
            '&'
        } else {
            '?'
        };
        found(&format!("{}{separator}{query}", self.settings.login_url))
    }
}

/// The signed-in user, or `None` for guests and unknown usernames.
pub struct Viewer(pub Option<UserRecord>);

impl Viewer {
    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.username.as_str())
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_ref(state);
        auth.resolve(parts)
            .await
            .map(Viewer)
            .map_err(IntoResponse::into_response)
    }
}

/// A signed-in user. Guests are redirected to the login page.
pub struct CurrentUser(pub UserRecord);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_ref(state);
        match auth.resolve(parts).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(auth.login_redirect(parts)),
            Err(err) => Err(err.into_response()),
        }
    }
}
