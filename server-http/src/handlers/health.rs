use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let coordinator = &state.coordinator;
    let cache = coordinator.cache().name().to_string();
    let durable = coordinator.durable().name().to_string();

    match coordinator.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                message: "OK".into(),
                cache,
                durable,
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    message: e.to_string(),
                    cache,
                    durable,
                }),
            )
        }
    }
}
