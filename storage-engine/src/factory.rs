use crate::document::DocumentBackend;
use crate::model::{ModelBackend, RecordModel};
use crate::moka_cache::MokaCache;
use crate::redis_store::{RedisCache, RedisKeyValueStore};
use crate::sled_kv::SledKeyValueStore;
use shared::config::{CacheSettings, DurableSettings};
use shared::{Error, Leg, Result, StoreError};
use std::sync::Arc;
use tandem::{CacheBackend, DurableBackend};
use tracing::info;

fn startup_error(leg: Leg, err: StoreError) -> Error {
    Error::BackendUnavailable(leg, err.to_string())
}

/// Build the cache tier from configuration and make sure it answers
pub async fn connect_cache(settings: &CacheSettings) -> Result<Arc<dyn CacheBackend>> {
    let cache: Arc<dyn CacheBackend> = match settings {
        CacheSettings::Redis(endpoint) => Arc::new(
            RedisCache::connect(endpoint)
                .await
                .map_err(|e| startup_error(Leg::Cache, e))?,
        ),
        CacheSettings::Memory { max_entries, ttl } => Arc::new(MokaCache::new(*max_entries, *ttl)),
    };

    cache.ping().await.map_err(|e| startup_error(Leg::Cache, e))?;
    info!("Cache backend ready: {}", cache.name());
    Ok(cache)
}

/// Build the durable tier from configuration and make sure it answers
pub async fn connect_durable(settings: &DurableSettings) -> Result<Arc<dyn DurableBackend>> {
    let durable: Arc<dyn DurableBackend> = match settings {
        DurableSettings::Redis { endpoint, prefix } => Arc::new(
            RedisKeyValueStore::connect(endpoint, prefix.as_deref())
                .await
                .map_err(|e| startup_error(Leg::Durable, e))?,
        ),
        DurableSettings::SledKeyValue { path } => Arc::new(
            SledKeyValueStore::open(path).map_err(|e| startup_error(Leg::Durable, e))?,
        ),
        DurableSettings::SledDocument { path, collection } => Arc::new(
            DocumentBackend::open(path, collection)
                .map_err(|e| startup_error(Leg::Durable, e))?,
        ),
        DurableSettings::SledModel { path } => Arc::new(
            ModelBackend::<RecordModel>::open(path)
                .map_err(|e| startup_error(Leg::Durable, e))?,
        ),
    };

    durable
        .ping()
        .await
        .map_err(|e| startup_error(Leg::Durable, e))?;
    info!("Durable backend ready: {}", durable.name());
    Ok(durable)
}
