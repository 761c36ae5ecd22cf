use crate::error::ApiError;
use crate::models::{ReadResponse, WriteResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

/// GET /read/:key
pub async fn read_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ReadResponse>, ApiError> {
    info!("READ: key={}", key);

    let result = state.coordinator.read(&key).await?;
    Ok(Json(ReadResponse::from(&result)))
}

/// GET /write/:key/:value
pub async fn write_value(
    State(state): State<AppState>,
    Path((key, value)): Path<(String, String)>,
) -> Result<Json<WriteResponse>, ApiError> {
    info!("WRITE: key={}", key);

    let result = state.coordinator.write(&key, &value).await?;
    Ok(Json(WriteResponse::from(result)))
}
