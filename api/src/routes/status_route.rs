use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// Handler: GET /. Liveness only; provider checks live on `/health`.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "grounded product Q&A API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
