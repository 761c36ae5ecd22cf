//! Redis adapters.
//!
//! The same connection wrapper backs two tiers:
//! - [`RedisCache`]: the volatile cache, plain `GET`/`SET`.
//! - [`RedisKeyValueStore`]: Redis used as the durable key-value store, usually
//!   on its own database index and optionally with a key prefix.
//!
//! Both hold a [`ConnectionManager`], which multiplexes one connection across
//! all in-flight requests and reconnects on its own after a drop.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use shared::config::RedisEndpoint;
use shared::{StoreError, StoreResult};
use std::fmt::Debug;
use tandem::{CacheBackend, DurableBackend};
use tracing::{debug, info};

/// Map a driver error onto the adapter taxonomy
pub(crate) fn classify(err: redis::RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Operation(err.to_string())
    }
}

pub(crate) fn connection_info(endpoint: &RedisEndpoint) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(endpoint.host.clone(), endpoint.port),
        redis: RedisConnectionInfo {
            db: endpoint.db,
            password: endpoint.password.clone(),
            ..Default::default()
        },
    }
}

#[derive(Clone)]
struct RedisConnection {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisConnection {
    async fn open(endpoint: &RedisEndpoint, prefix: Option<&str>) -> StoreResult<Self> {
        let client = Client::open(connection_info(endpoint)).map_err(classify)?;
        let connection = ConnectionManager::new(client).await.map_err(classify)?;

        info!(
            "Connected to Redis at {}:{} (db {})",
            endpoint.host, endpoint.port, endpoint.db
        );

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        prefixed(&self.prefix, key)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.prefixed_key(key)).await.map_err(classify)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .set(self.prefixed_key(key), value)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(classify)?;
        debug!("Redis PING -> {}", reply);
        Ok(())
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}", prefix, key)
    }
}

/// Redis as the cache tier
#[derive(Clone)]
pub struct RedisCache {
    inner: RedisConnection,
}

impl RedisCache {
    pub async fn connect(endpoint: &RedisEndpoint) -> StoreResult<Self> {
        Ok(Self {
            inner: RedisConnection::open(endpoint, None).await?,
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

impl Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

/// Redis as the durable tier. `put` is an upsert.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    inner: RedisConnection,
}

impl RedisKeyValueStore {
    pub async fn connect(endpoint: &RedisEndpoint, prefix: Option<&str>) -> StoreResult<Self> {
        Ok(Self {
            inner: RedisConnection::open(endpoint, prefix).await?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }
}

#[async_trait]
impl DurableBackend for RedisKeyValueStore {
    fn name(&self) -> &'static str {
        "redis-kv"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

impl Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("prefix", &self.inner.prefix)
            .finish_non_exhaustive()
    }
}
