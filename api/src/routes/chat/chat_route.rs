//! POST /chat: answers one customer question about one item.

use std::sync::Arc;

use axum::{Json, extract::State};
use grounding::ChatTurnResponse;
use tracing::info;

use crate::{
    core::app_state::AppState, error_handler::AppResult, routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/chat \
///   -H 'content-type: application/json' \
///   -d '{"query":"세탁기에 돌려도 되나요?","item_id":1}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatTurnResponse>> {
    let resp = state
        .orchestrator
        .handle_turn(&body.query, body.item_id, &body.backend, &body.asked_questions)
        .await?;

    info!(
        item_id = resp.item_id,
        sources = resp.sources.len(),
        suggestions = resp.suggested_questions.len(),
        "chat turn answered"
    );
    Ok(Json(resp))
}
