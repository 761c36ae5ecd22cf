use crate::domain::{AccessResult, Source, TimedValue, WriteResult};
use crate::ports::{CacheBackend, DurableBackend};
use crate::timer::Timer;
use shared::{Error, Leg, Result, StoreError};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Read-through / write-through coordinator over a cache and a durable store.
///
/// Reads always consult both tiers so that the result reports the latency of
/// each. Writes go to the cache first and only then to the durable store.
/// Cloning is cheap; clones share the same backends.
#[derive(Clone)]
pub struct AccessCoordinator {
    cache: Arc<dyn CacheBackend>,
    durable: Arc<dyn DurableBackend>,
}

impl AccessCoordinator {
    pub fn new(cache: Arc<dyn CacheBackend>, durable: Arc<dyn DurableBackend>) -> Self {
        Self { cache, durable }
    }

    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    pub fn durable(&self) -> &Arc<dyn DurableBackend> {
        &self.durable
    }

    #[instrument(skip(self), fields(cache = self.cache.name(), durable = self.durable.name()))]
    pub async fn read(&self, key: &str) -> Result<AccessResult> {
        let timer = Timer::start();

        // A broken cache must not take reads down with it
        let cached = match self.cache.get(key).await {
            Ok(Some(data)) => Some(TimedValue::new(
                Some(data),
                Source::Cache,
                timer.elapsed_ms(),
            )),
            Ok(None) => {
                debug!("Cache miss");
                None
            }
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                None
            }
        };

        let data = self.durable.get(key).await.map_err(durable_read_error)?;
        let durable = TimedValue::new(data, Source::Durable, timer.elapsed_ms());

        debug!(
            cache_hit = cached.is_some(),
            durable_hit = durable.found(),
            duration_ms = durable.duration_ms,
            "Read complete"
        );

        Ok(AccessResult { cached, durable })
    }

    #[instrument(skip(self, value), fields(value_len = value.len()))]
    pub async fn write(&self, key: &str, value: &str) -> Result<WriteResult> {
        if let Err(source) = self.cache.set(key, value).await {
            warn!("Cache leg failed, durable leg skipped: {}", source);
            return Err(Error::Backend {
                leg: Leg::Cache,
                source,
            });
        }

        if let Err(source) = self.durable.put(key, value).await {
            // The cache already holds the new value; no rollback is attempted
            warn!("Durable leg failed after cache leg succeeded: {}", source);
            return Err(Error::Backend {
                leg: Leg::Durable,
                source,
            });
        }

        debug!("Write complete");
        Ok(WriteResult::ok())
    }

    /// Probe both backends, reporting the first that does not answer
    pub async fn ping(&self) -> Result<()> {
        self.cache
            .ping()
            .await
            .map_err(|e| Error::BackendUnavailable(Leg::Cache, e.to_string()))?;
        self.durable
            .ping()
            .await
            .map_err(|e| Error::BackendUnavailable(Leg::Durable, e.to_string()))?;
        Ok(())
    }

    /// Release both backends. Both are always attempted.
    pub async fn shutdown(&self) -> Result<()> {
        let cache = self.cache.shutdown().await;
        let durable = self.durable.shutdown().await;

        if let Err(source) = cache {
            return Err(Error::Backend {
                leg: Leg::Cache,
                source,
            });
        }
        if let Err(source) = durable {
            return Err(Error::Backend {
                leg: Leg::Durable,
                source,
            });
        }

        info!("Backends released");
        Ok(())
    }
}

fn durable_read_error(err: StoreError) -> Error {
    match err {
        StoreError::Unavailable(reason) => Error::BackendUnavailable(Leg::Durable, reason),
        source => Error::Backend {
            leg: Leg::Durable,
            source,
        },
    }
}

impl Debug for AccessCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCoordinator")
            .field("cache", &self.cache.name())
            .field("durable", &self.durable.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::StoreResult;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory store serving as either tier, with switchable failures
    #[derive(Default)]
    struct FakeStore {
        entries: Mutex<HashMap<String, String>>,
        failure: Mutex<Option<StoreError>>,
        delay: Option<Duration>,
        writes: AtomicUsize,
        shut_down: AtomicBool,
    }

    impl FakeStore {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay: Some(delay),
                ..Self::default()
            })
        }

        fn fail_with(&self, err: StoreError) {
            *self.failure.lock().unwrap() = Some(err);
        }

        fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        fn value(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn lookup(&self, key: &str) -> StoreResult<Option<String>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self.value(key))
        }

        async fn store(&self, key: &str, value: &str) -> StoreResult<()> {
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl CacheBackend for FakeStore {
        fn name(&self) -> &'static str {
            "fake-cache"
        }

        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.lookup(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.store(key, value).await
        }

        async fn ping(&self) -> StoreResult<()> {
            self.lookup("").await.map(|_| ())
        }

        async fn shutdown(&self) -> StoreResult<()> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl DurableBackend for FakeStore {
        fn name(&self) -> &'static str {
            "fake-durable"
        }

        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.lookup(key).await
        }

        async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
            self.store(key, value).await
        }

        async fn ping(&self) -> StoreResult<()> {
            self.lookup("").await.map(|_| ())
        }

        async fn shutdown(&self) -> StoreResult<()> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn coordinator(cache: &Arc<FakeStore>, durable: &Arc<FakeStore>) -> AccessCoordinator {
        AccessCoordinator::new(cache.clone(), durable.clone())
    }

    #[tokio::test]
    async fn test_write_then_read_hits_both_tiers() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);

        let written = coordinator.write("session:42", "active").await.unwrap();
        assert_eq!(written, WriteResult::ok());

        let result = coordinator.read("session:42").await.unwrap();
        let cached = result.cached.expect("cache should hold the value");
        assert_eq!(cached.data.as_deref(), Some("active"));
        assert_eq!(cached.source, Source::Cache);
        assert_eq!(result.durable.data.as_deref(), Some("active"));
        assert_eq!(result.durable.source, Source::Durable);
        assert!(cached.duration_ms <= result.durable.duration_ms);
    }

    #[tokio::test]
    async fn test_read_unknown_key() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);

        let result = coordinator.read("unknown-key").await.unwrap();
        assert!(result.cached.is_none());
        assert!(result.durable.data.is_none());
        assert_eq!(result.durable.data_or_sentinel(), crate::NOT_FOUND);
        assert!(result.durable.duration_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_cache_miss_still_reads_durable() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        durable.store("k", "from-durable").await.unwrap();
        let coordinator = coordinator(&cache, &durable);

        let result = coordinator.read("k").await.unwrap();
        assert!(result.cached.is_none());
        assert_eq!(result.durable.data.as_deref(), Some("from-durable"));
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_miss() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        durable.store("k", "v").await.unwrap();
        cache.fail_with(StoreError::Unavailable("connection refused".into()));
        let coordinator = coordinator(&cache, &durable);

        let result = coordinator.read("k").await.unwrap();
        assert!(result.cached.is_none());
        assert_eq!(result.durable.data.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_durable_unavailable_fails_read() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        cache.store("k", "v").await.unwrap();
        durable.fail_with(StoreError::Unavailable("timed out".into()));
        let coordinator = coordinator(&cache, &durable);

        let err = coordinator.read("k").await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(Leg::Durable, _)));
    }

    #[tokio::test]
    async fn test_durable_operation_error_keeps_leg() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        durable.fail_with(StoreError::Codec("bad document".into()));
        let coordinator = coordinator(&cache, &durable);

        let err = coordinator.read("k").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                leg: Leg::Durable,
                source: StoreError::Codec(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_cache_leg_failure_skips_durable() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        cache.fail_with(StoreError::Unavailable("down".into()));
        let coordinator = coordinator(&cache, &durable);

        let err = coordinator.write("k", "v").await.unwrap_err();
        assert_eq!(err.leg(), Some(Leg::Cache));
        assert!(!durable.contains("k"));
        assert_eq!(durable.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_durable_leg_failure_leaves_cache_written() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        durable.fail_with(StoreError::Operation("disk full".into()));
        let coordinator = coordinator(&cache, &durable);

        let err = coordinator.write("k", "v").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                leg: Leg::Durable,
                ..
            }
        ));
        assert_eq!(cache.value("k").as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);

        coordinator.write("k", "v1").await.unwrap();
        coordinator.write("k", "v2").await.unwrap();

        let result = coordinator.read("k").await.unwrap();
        assert_eq!(result.durable.data.as_deref(), Some("v2"));
        assert_eq!(result.cached.unwrap().data.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_cached_duration_not_above_durable_duration() {
        let cache = FakeStore::new();
        let durable = FakeStore::slow(Duration::from_millis(5));
        let coordinator = coordinator(&cache, &durable);
        coordinator.write("k", "v").await.unwrap();

        let result = coordinator.read("k").await.unwrap();
        let cached = result.cached.unwrap();
        assert!(cached.duration_ms >= 0.0);
        assert!(cached.duration_ms <= result.durable.duration_ms);
        assert!(result.durable.duration_ms >= 5.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_and_writes() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);

        let mut handles = Vec::new();
        for i in 0..32 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key:{}", i);
                let value = format!("value:{}", i);
                coordinator.write(&key, &value).await.unwrap();
                let result = coordinator.read(&key).await.unwrap();
                assert_eq!(result.durable.data, Some(value));
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(durable.writes.load(Ordering::SeqCst), 32);
    }

    #[tokio::test]
    async fn test_ping_names_failing_leg() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);
        assert!(coordinator.ping().await.is_ok());

        durable.fail_with(StoreError::Unavailable("refused".into()));
        let err = coordinator.ping().await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(Leg::Durable, _)));
    }

    #[tokio::test]
    async fn test_shutdown_releases_both_backends() {
        let cache = FakeStore::new();
        let durable = FakeStore::new();
        let coordinator = coordinator(&cache, &durable);

        coordinator.shutdown().await.unwrap();
        assert!(cache.shut_down.load(Ordering::SeqCst));
        assert!(durable.shut_down.load(Ordering::SeqCst));
    }
}
