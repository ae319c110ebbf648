use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::application::admin::groups::{CreateGroupCommand, UpdateGroupCommand};

use super::AdminState;
use super::error::{ApiError, group_to_api};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct GroupListQuery {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GroupCreateRequest {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct GroupUpdateRequest {
    title: Option<String>,
    description: Option<String>,
}

pub(super) async fn list_groups(
    State(state): State<AdminState>,
    Query(query): Query<GroupListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .groups
        .list(query.search.as_deref())
        .await
        .map_err(group_to_api)?;
    Ok(Json(groups))
}

pub(super) async fn get_group(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.groups.find(&slug).await.map_err(group_to_api)?;
    Ok(Json(group))
}

pub(super) async fn create_group(
    State(state): State<AdminState>,
    Json(payload): Json<GroupCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateGroupCommand {
        title: payload.title,
        slug: payload.slug,
        description: payload.description,
    };

    let group = state.groups.create(command).await.map_err(group_to_api)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub(super) async fn update_group(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(payload): Json<GroupUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateGroupCommand {
        title: payload.title,
        description: payload.description,
    };

    let group = state
        .groups
        .update(&slug, command)
        .await
        .map_err(group_to_api)?;
    Ok(Json(group))
}

pub(super) async fn delete_group(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.groups.delete(&slug).await.map_err(group_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
