use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::pagination::PageNumber;

use super::AdminState;
use super::error::{ApiError, post_to_api};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostListQuery {
    search: Option<String>,
    page: Option<String>,
}

/// `{"group": "cats"}` moves the post, `{"group": null}` detaches it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AssignGroupRequest {
    group: Option<String>,
}

pub(super) async fn list_posts(
    State(state): State<AdminState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .posts
        .list(query.search.as_deref(), PageNumber::parse(query.page.as_deref()))
        .await
        .map_err(post_to_api)?;
    Ok(Json(page))
}

pub(super) async fn assign_group(
    State(state): State<AdminState>,
    Path(post_id): Path<String>,
    Json(payload): Json<AssignGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state
        .posts
        .assign_group(post_id, payload.group.as_deref())
        .await
        .map_err(post_to_api)?;
    Ok(Json(post))
}

pub(super) async fn delete_post(
    State(state): State<AdminState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    state.posts.delete(post_id).await.map_err(post_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| ApiError::bad_request("invalid post id", Some(err.to_string())))
}
