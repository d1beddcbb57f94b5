//! GET /health: provider health snapshots. Always `200`; per-provider
//! failures are reported in the body.

use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"` when every provider check succeeded, `"degraded"` otherwise.
    pub status: &'static str,
    pub providers: Vec<HealthStatus>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let providers = state.llm.health_all().await;
    let status = if providers.iter().all(|p| p.ok) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, providers })
}
