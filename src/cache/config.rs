//! Feed page cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_FEED_TTL_SECS: u64 = 20;
const DEFAULT_FEED_PAGE_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Serve the global feed from the page cache.
    pub enable_feed_cache: bool,
    /// Seconds a rendered feed page stays fresh.
    pub feed_ttl_seconds: u64,
    /// Most feed pages held at once.
    pub feed_page_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_feed_cache: true,
            feed_ttl_seconds: DEFAULT_FEED_TTL_SECS,
            feed_page_limit: DEFAULT_FEED_PAGE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_feed_cache: settings.enable_feed_cache,
            feed_ttl_seconds: settings.feed_ttl.as_secs(),
            feed_page_limit: settings.feed_page_limit,
        }
    }
}

impl CacheConfig {
    /// Time-to-live, never shorter than one second.
    pub fn feed_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_ttl_seconds.max(1))
    }

    /// Page limit as NonZeroUsize, clamping to 1 if zero.
    pub fn feed_page_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.feed_page_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
