//! Feed page cache.
//!
//! The rendered global feed is served from memory for a short window
//! (20 seconds by default). New posts do not refresh it; readers see the
//! stored page until it expires or an administrator invalidates the cache.
//!
//! ```toml
//! [cache]
//! enable_feed_cache = true
//! feed_ttl_seconds = 20
//! feed_page_limit = 256
//! ```

mod config;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use middleware::feed_cache_layer;
pub use store::{CachedResponse, FeedCacheKey, FeedPageCache};
