use serde::Serialize;
use shared::Leg;
use tandem::{AccessResult, Source, TimedValue, WriteResult, WriteStatus};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub available_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub cache: String,
    pub durable: String,
}

// === Access Models ===

#[derive(Debug, Serialize)]
pub struct TimedValueResponse {
    /// The value, or the not-found sentinel
    pub data: String,
    pub source: Source,
    /// Milliseconds with two decimals
    pub duration: String,
}

impl From<&TimedValue> for TimedValueResponse {
    fn from(value: &TimedValue) -> Self {
        Self {
            data: value.data_or_sentinel().to_string(),
            source: value.source,
            duration: format!("{:.2}", value.duration_ms),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub cached: Option<TimedValueResponse>,
    pub durable: TimedValueResponse,
}

impl From<&AccessResult> for ReadResponse {
    fn from(result: &AccessResult) -> Self {
        Self {
            cached: result.cached.as_ref().map(TimedValueResponse::from),
            durable: TimedValueResponse::from(&result.durable),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub status: WriteStatus,
}

impl From<WriteResult> for WriteResponse {
    fn from(result: WriteResult) -> Self {
        Self {
            status: result.status,
        }
    }
}

// === Error Models ===

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg: Option<Leg>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, leg: Option<Leg>) -> Self {
        Self {
            error: error.into(),
            leg,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub message: String,
    pub status: u16,
}
