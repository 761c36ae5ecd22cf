use async_trait::async_trait;
use moka::future::Cache;
use shared::StoreResult;
use std::fmt::Debug;
use std::time::Duration;
use tandem::CacheBackend;

/// Moka-based in-process cache tier
/// Lock-free and concurrent, with optional entry bound and a cache-wide TTL
#[derive(Clone)]
pub struct MokaCache {
    cache: Cache<String, String>,
}

impl MokaCache {
    /// Create a new unbounded Moka cache with optional default TTL
    pub fn new_unbounded(default_ttl: Option<Duration>) -> Self {
        Self::new(None, default_ttl)
    }

    /// Create a new bounded Moka cache with max entries and optional default TTL
    pub fn new_bounded(max_entries: u64, default_ttl: Option<Duration>) -> Self {
        Self::new(Some(max_entries), default_ttl)
    }

    pub fn new(max_entries: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().name("tandem-cache");

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = default_ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheBackend for MokaCache {
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        // Expired entries read as absent
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
