// shared/src/lib.rs

use serde::Serialize;
use std::fmt;

/// One of the two stores a request touches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Cache,
    Durable,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Cache => f.write_str("cache"),
            Leg::Durable => f.write_str("durable"),
        }
    }
}

/// Failure reported by a storage adapter, before the coordinator knows which leg it was
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("operation failed: {0}")]
    Operation(String),
    #[error("codec: {0}")]
    Codec(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} backend unavailable: {1}")]
    BackendUnavailable(Leg, String),
    #[error("{leg} leg failed: {source}")]
    Backend {
        leg: Leg,
        #[source]
        source: StoreError,
    },
    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    /// Leg the failure is attributed to, if any
    pub fn leg(&self) -> Option<Leg> {
        match self {
            Error::BackendUnavailable(leg, _) | Error::Backend { leg, .. } => Some(*leg),
            _ => None,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
