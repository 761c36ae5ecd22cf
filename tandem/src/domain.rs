use serde::{Deserialize, Serialize};

/// Presentation sentinel for a key the durable store does not hold
pub const NOT_FOUND: &str = "not found";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Durable,
}

/// A lookup outcome together with how long it took since the read started
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimedValue {
    pub data: Option<String>,
    pub source: Source,
    pub duration_ms: f64,
}

impl TimedValue {
    pub fn new(data: Option<String>, source: Source, duration_ms: f64) -> Self {
        Self {
            data,
            source,
            duration_ms,
        }
    }

    pub fn found(&self) -> bool {
        self.data.is_some()
    }

    /// The value, or [`NOT_FOUND`] when the store had nothing
    pub fn data_or_sentinel(&self) -> &str {
        self.data.as_deref().unwrap_or(NOT_FOUND)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccessResult {
    /// `None` on a cache miss (or a cache failure that was degraded to a miss)
    pub cached: Option<TimedValue>,
    pub durable: TimedValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WriteStatus {
    #[serde(rename = "OK")]
    Ok,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub status: WriteStatus,
}

impl WriteResult {
    pub fn ok() -> Self {
        Self {
            status: WriteStatus::Ok,
        }
    }
}
