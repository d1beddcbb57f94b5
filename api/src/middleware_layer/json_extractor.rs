use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ErrorEnvelope};

/// Request fields named in deserializer messages, most specific first.
const REQUEST_FIELDS: &[&str] = &[
    "asked_questions",
    "conversation_history",
    "item_id",
    "product_id",
    "backend",
    "engine",
    "query",
];

const REQUEST_ID: &str = "X-Request-Id";

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    REQUEST_FIELDS
        .iter()
        .find(|key| msg.contains(*key))
        .map(|key| key.to_string())
}

fn hint_for(msg: &str) -> Option<String> {
    if msg.contains("missing field") {
        Some("Required fields: `query` (string) and `item_id` (integer).".into())
    } else if msg.contains("expected a sequence") {
        Some("Expected an array of strings here (e.g. [\"question 1\"]).".into())
    } else if msg.contains("expected i64") || msg.contains("invalid type: string") {
        Some("Expected an integer here (e.g. 42).".into())
    } else if msg.contains("expected a map") || msg.contains("expected struct") {
        Some("Expected a JSON object here (e.g. { \"query\": \"...\", \"item_id\": 1 }).".into())
    } else {
        None
    }
}

fn request_id(parts: &axum::http::response::Parts) -> String {
    if let Some(v) = parts.headers.get(REQUEST_ID).and_then(|h| h.to_str().ok()) {
        if !v.trim().is_empty() {
            return v.to_string();
        }
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

/// Wraps axum's plain-text JSON rejections (400/422) into [`ErrorEnvelope`].
///
/// Responses that already carry a JSON body, such as `AppError`, pass through.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return res;
    }

    let (parts, bytes) = take_body(res).await;
    let original = String::from_utf8_lossy(&bytes);
    let req_id = request_id(&parts);
    debug!(%status, request_id = %req_id, message = %original.trim(), "request body rejected");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: hint_for(&original),
    };
    let code = if status == StatusCode::BAD_REQUEST {
        "BAD_REQUEST"
    } else {
        "UNPROCESSABLE_ENTITY"
    };

    let mut out = ErrorEnvelope::new(code, original.trim(), vec![detail]).into_response_with_status(status);
    if let Ok(v) = HeaderValue::from_str(&req_id) {
        out.headers_mut().insert(REQUEST_ID, v);
    }
    out
}
