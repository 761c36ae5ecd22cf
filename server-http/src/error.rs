use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

/// Core error as seen by HTTP clients
#[derive(Debug)]
pub struct ApiError(pub shared::Error);

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            shared::Error::BackendUnavailable(..) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("Request failed with {}: {}", status, self.0);

        let body = ErrorResponse::new(self.0.to_string(), self.0.leg());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Error, Leg, StoreError};

    #[test]
    fn test_status_codes() {
        let unavailable = ApiError(Error::BackendUnavailable(Leg::Durable, "refused".into()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let leg_failed = ApiError(Error::Backend {
            leg: Leg::Cache,
            source: StoreError::Operation("READONLY".into()),
        });
        assert_eq!(leg_failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let config = ApiError(Error::Config("bad CACHE_BACKEND".into()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
