use crate::models::{NotFoundResponse, RootResponse};
use axum::{http::StatusCode, Json};

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Looks like you've hit the root URL".into(),
        available_urls: vec!["/write/{key}/{value}".into(), "/read/{key}".into()],
    })
}

/// Any unmatched route
pub async fn not_found() -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            message: "No route here; try /read/{key} or /write/{key}/{value}".into(),
            status: StatusCode::NOT_FOUND.as_u16(),
        }),
    )
}
