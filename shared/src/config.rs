use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Where a Redis server lives. The password is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisEndpoint {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl fmt::Debug for RedisEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db", &self.db)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheSettings {
    Redis(RedisEndpoint),
    Memory {
        max_entries: Option<u64>,
        ttl: Option<Duration>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DurableSettings {
    Redis {
        endpoint: RedisEndpoint,
        prefix: Option<String>,
    },
    SledKeyValue {
        path: PathBuf,
    },
    SledDocument {
        path: PathBuf,
        collection: String,
    },
    SledModel {
        path: PathBuf,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cache: CacheSettings,
    pub durable: DurableSettings,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5050;
    const DEFAULT_REDIS_HOST: &str = "localhost";
    const DEFAULT_REDIS_PORT: u16 = 6379;
    const DEFAULT_DURABLE_REDIS_DB: i64 = 1;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_COLLECTION: &str = "records";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("TANDEM_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = parse_or(var("PORT"), "PORT", Self::DEFAULT_PORT);

        let cache_endpoint = RedisEndpoint {
            host: var("REDIS_HOST").unwrap_or_else(|| Self::DEFAULT_REDIS_HOST.to_string()),
            port: parse_or(var("REDIS_PORT"), "REDIS_PORT", Self::DEFAULT_REDIS_PORT),
            password: var("REDIS_AUTH"),
            db: parse_or(var("REDIS_DB"), "REDIS_DB", 0),
        };

        let cache = match var("CACHE_BACKEND").as_deref().unwrap_or("redis") {
            "redis" => CacheSettings::Redis(cache_endpoint.clone()),
            "memory" => CacheSettings::Memory {
                max_entries: parse_limit(var("CACHE_MAX_ENTRIES"), "CACHE_MAX_ENTRIES"),
                ttl: parse_limit(var("CACHE_TTL_MS"), "CACHE_TTL_MS").map(Duration::from_millis),
            },
            other => {
                return Err(Error::Config(format!(
                    "unknown CACHE_BACKEND '{}' (expected redis or memory)",
                    other
                )));
            }
        };

        let data_dir = PathBuf::from(
            var("TANDEM_DATA_DIR").unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
        );

        let durable = match var("DURABLE_BACKEND").as_deref().unwrap_or("sled") {
            "redis" => {
                let endpoint = RedisEndpoint {
                    host: var("DURABLE_REDIS_HOST").unwrap_or_else(|| cache_endpoint.host.clone()),
                    port: parse_or(
                        var("DURABLE_REDIS_PORT"),
                        "DURABLE_REDIS_PORT",
                        cache_endpoint.port,
                    ),
                    password: var("DURABLE_REDIS_AUTH").or_else(|| cache_endpoint.password.clone()),
                    db: parse_or(
                        var("DURABLE_REDIS_DB"),
                        "DURABLE_REDIS_DB",
                        Self::DEFAULT_DURABLE_REDIS_DB,
                    ),
                };
                if matches!(cache, CacheSettings::Redis(ref c) if *c == endpoint) {
                    warn!("Durable Redis endpoint is the cache endpoint; both legs hit the same store");
                }
                DurableSettings::Redis {
                    endpoint,
                    prefix: var("DURABLE_PREFIX"),
                }
            }
            "sled" => DurableSettings::SledKeyValue {
                path: data_dir.join("records.sled"),
            },
            "document" => DurableSettings::SledDocument {
                path: data_dir.join("documents.sled"),
                collection: var("DURABLE_COLLECTION")
                    .unwrap_or_else(|| Self::DEFAULT_COLLECTION.to_string()),
            },
            "model" => DurableSettings::SledModel {
                path: data_dir.join("models.sled"),
            },
            other => {
                return Err(Error::Config(format!(
                    "unknown DURABLE_BACKEND '{}' (expected redis, sled, document or model)",
                    other
                )));
            }
        };

        Ok(Self {
            host,
            port,
            cache,
            durable,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", name, value, default);
            default
        }),
        None => default,
    }
}

/// Optional positive limit; `0` means unlimited, garbage warns and also means unlimited
fn parse_limit(raw: Option<String>, name: &str) -> Option<u64> {
    let value = raw?;
    match value.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(limit) => Some(limit),
        Err(_) => {
            warn!("{} has invalid value '{}', leaving it unlimited", name, value);
            None
        }
    }
}
