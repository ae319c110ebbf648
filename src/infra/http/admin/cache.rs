use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::info;

use super::AdminState;
use super::error::{ApiError, codes};

#[derive(Debug, Serialize)]
struct InvalidateResponse {
    removed: usize,
}

/// Drop every cached feed page so the next request renders fresh content.
pub(super) async fn invalidate_cache(
    State(state): State<AdminState>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(cache) = state.cache.as_ref() else {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            codes::CACHE_DISABLED,
            "Feed cache is disabled",
            None,
        ));
    };

    let removed = cache.invalidate_all();
    info!(target = "murmur::admin::cache", removed, "feed cache invalidated");
    Ok(Json(InvalidateResponse { removed }))
}
