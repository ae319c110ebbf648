use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AdminState;
use super::error::{ApiError, user_to_api};

#[derive(Debug, Deserialize)]
pub(super) struct RegisterUserRequest {
    username: String,
}

pub(super) async fn register_user(
    State(state): State<AdminState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .register(&payload.username)
        .await
        .map_err(user_to_api)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(super) async fn get_user(
    State(state): State<AdminState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.find(&username).await.map_err(user_to_api)?;
    Ok(Json(user))
}

/// Removes the user with their posts, comments and follow edges.
pub(super) async fn delete_user(
    State(state): State<AdminState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(&username).await.map_err(user_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
