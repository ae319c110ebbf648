//! Rendered feed pages held for a bounded time.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::lock;

/// Identity of a cached feed page. Only the global feed is cached, one entry
/// per page number, shared by every viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedCacheKey {
    Global { page: u32 },
}

impl FeedCacheKey {
    fn label(&self) -> &'static str {
        match self {
            FeedCacheKey::Global { .. } => "global",
        }
    }
}

/// A rendered response, stored byte for byte.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: &axum::http::HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// Time-bounded, size-bounded store for rendered feed pages.
///
/// Entries expire `ttl` after they were stored. Once `capacity` pages are
/// held, storing another evicts the least recently used one. Concurrent
/// refills after expiry race; whichever write lands last wins.
pub struct FeedPageCache {
    ttl: Duration,
    entries: RwLock<LruCache<FeedCacheKey, Entry>>,
}

impl FeedPageCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.feed_ttl(), config.feed_page_limit_non_zero())
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, CacheConfig::default().feed_page_limit_non_zero())
    }

    pub fn with_limits(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        lock::read(&self.entries, "capacity").cap().get()
    }

    /// Fresh entry for `key`, if any. Expired entries count as misses and are
    /// dropped on the way out.
    pub fn get(&self, key: &FeedCacheKey) -> Option<CachedResponse> {
        let hit = {
            let mut entries = lock::write(&self.entries, "get");
            let fresh = entries
                .peek(key)
                .map(|entry| entry.stored_at.elapsed() < self.ttl);
            match fresh {
                Some(true) => entries.get(key).map(|entry| entry.response.clone()),
                Some(false) => {
                    entries.pop(key);
                    None
                }
                None => None,
            }
        };

        match hit {
            Some(response) => {
                counter!("murmur_feed_cache_hit_total", "feed" => key.label()).increment(1);
                Some(response)
            }
            None => {
                counter!("murmur_feed_cache_miss_total", "feed" => key.label()).increment(1);
                None
            }
        }
    }

    pub fn put(&self, key: FeedCacheKey, response: CachedResponse) {
        let entry = Entry {
            response,
            stored_at: Instant::now(),
        };
        let evicted = lock::write(&self.entries, "put")
            .push(key, entry)
            .map(|(evicted, _)| evicted)
            .filter(|evicted| *evicted != key);

        counter!("murmur_feed_cache_store_total", "feed" => key.label()).increment(1);
        if let Some(evicted) = evicted {
            counter!("murmur_feed_cache_evict_total", "feed" => evicted.label()).increment(1);
            debug!(target = "murmur::cache", ?evicted, "feed page evicted");
        }
    }

    /// Drop every cached page. Returns how many entries were removed.
    pub fn invalidate_all(&self) -> usize {
        let removed = {
            let mut entries = lock::write(&self.entries, "invalidate_all");
            let removed = entries.len();
            entries.clear();
            removed
        };

        counter!("murmur_feed_cache_invalidate_total").increment(1);
        debug!(target = "murmur::cache", removed, "feed cache invalidated");
        removed
    }

    pub fn len(&self) -> usize {
        lock::read(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
