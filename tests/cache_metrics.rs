mod support;

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::OnceLock;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use murmur::cache::{CachedResponse, FeedCacheKey, FeedPageCache};
use murmur::infra::http::build_router;
use serial_test::serial;
use support::TestApp;
use tempfile::TempDir;
use tower::ServiceExt;

fn snapshotter() -> &'static Snapshotter {
    static SNAPSHOTTER: OnceLock<Snapshotter> = OnceLock::new();
    SNAPSHOTTER.get_or_init(|| {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .expect("debug metrics recorder should install in this test process");
        snapshotter
    })
}

/// Counter totals by metric name, plus every metric name seen.
fn observed() -> (HashMap<String, u64>, HashSet<String>) {
    let mut totals = HashMap::new();
    let mut names = HashSet::new();
    for (key, _, _, value) in snapshotter().snapshot().into_vec() {
        let name = key.key().name().to_string();
        if let DebugValue::Counter(count) = value {
            *totals.entry(name.clone()).or_insert(0) += count;
        }
        names.insert(name);
    }
    (totals, names)
}

#[tokio::test]
#[serial]
async fn feed_requests_emit_cache_and_latency_metrics() {
    snapshotter();
    let dir = TempDir::new().expect("temp dir");
    let app = TestApp::with_cache(dir.path(), Duration::from_secs(20));
    let author = app.store.seed_user("leo");
    app.store.seed_post(&author, "metrics", None);
    let router = build_router(app.http_state());

    for _ in 0..2 {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .expect("request should build");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (totals, names) = observed();
    for metric in [
        "murmur_feed_cache_hit_total",
        "murmur_feed_cache_miss_total",
        "murmur_feed_cache_store_total",
    ] {
        assert!(
            totals.get(metric).copied().unwrap_or(0) >= 1,
            "missing metric: {metric}"
        );
    }

    assert!(
        names.contains("murmur_http_request_ms"),
        "missing request latency histogram"
    );
}

#[test]
#[serial]
fn invalidation_is_counted() {
    snapshotter();
    let cache = FeedPageCache::with_ttl(Duration::from_secs(20));
    cache.put(
        FeedCacheKey::Global { page: 1 },
        CachedResponse::new(StatusCode::OK, &Default::default(), "page".into()),
    );

    assert_eq!(cache.invalidate_all(), 1);
    let (totals, _) = observed();
    assert!(
        totals
            .get("murmur_feed_cache_invalidate_total")
            .copied()
            .unwrap_or(0)
            >= 1
    );
}

#[test]
#[serial]
fn eviction_is_counted() {
    snapshotter();
    let capacity = NonZeroUsize::new(1).expect("non-zero");
    let cache = FeedPageCache::with_limits(Duration::from_secs(20), capacity);
    for page in 1..=3 {
        cache.put(
            FeedCacheKey::Global { page },
            CachedResponse::new(StatusCode::OK, &Default::default(), "page".into()),
        );
    }

    assert_eq!(cache.len(), 1);
    let (totals, _) = observed();
    assert!(
        totals
            .get("murmur_feed_cache_evict_total")
            .copied()
            .unwrap_or(0)
            >= 2
    );
}
