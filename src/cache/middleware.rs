//! Response cache middleware for the global feed.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tracing::{debug, instrument, warn};

use crate::application::pagination::PageNumber;

use super::store::{CachedResponse, FeedCacheKey, FeedPageCache};

/// Serve `GET /` (any `?page=`) from the feed cache, filling it on a miss.
///
/// Only `200 OK` responses without cookies are stored.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn feed_cache_layer(
    State(cache): State<Arc<FeedPageCache>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = FeedCacheKey::Global {
        page: page_from_query(request.uri().query()).get(),
    };

    if let Some(cached) = cache.get(&key) {
        debug!(cache = "feed", outcome = "hit", ?key, "serving cached feed page");
        return cached.into_response();
    }

    debug!(cache = "feed", outcome = "miss", ?key, "rendering feed page");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(cache = "feed", error = %err, "failed to buffer feed page");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    cache.put(key, CachedResponse::new(parts.status, &parts.headers, bytes.clone()));
    Response::from_parts(parts, Body::from(bytes))
}

fn page_from_query(query: Option<&str>) -> PageNumber {
    let raw = query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "page")
            .map(|(_, value)| value.into_owned())
    });
    PageNumber::parse(raw.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_follows_feed_pagination_rules() {
        assert_eq!(page_from_query(None).get(), 1);
        assert_eq!(page_from_query(Some("page=2")).get(), 2);
        assert_eq!(page_from_query(Some("utm=x&page=-4")).get(), 1);
        assert_eq!(page_from_query(Some("page=oops")).get(), 1);
    }
}
