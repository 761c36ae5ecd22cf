use async_trait::async_trait;
use shared::StoreResult;

// Ports are the pluggable extension points for the two storage tiers.
// Implementations must tolerate concurrent calls from many in-flight requests.

/// Port for the fast, volatile tier
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Short name used in logs and health output
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Reachability probe, used at startup and by health checks
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Release resources before the process exits
    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Port for the slower, durable tier
///
/// Key-value stores upsert on `put`; document stores may insert a new document
/// per call, as long as `get` then returns the most recent value for the key.
#[async_trait]
pub trait DurableBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}
