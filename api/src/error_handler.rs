use ai_llm_service::error_handler::AiLlmError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grounding::GroundingError;
use rag_store::RagError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Rag(#[from] RagError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("item {0} not found")]
    ItemNotFound(i64),

    // --- Turn ---
    #[error(transparent)]
    Turn(#[from] GroundingError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Turn(GroundingError::InvalidBackend(_)) => StatusCode::BAD_REQUEST,

            // 5xx
            AppError::Turn(GroundingError::BackendUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Turn(GroundingError::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Llm(_) | AppError::Rag(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Llm(_) | AppError::Rag(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            AppError::Turn(GroundingError::InvalidBackend(_)) => "INVALID_BACKEND",
            AppError::Turn(GroundingError::BackendUnavailable(_)) => "BACKEND_UNAVAILABLE",
            AppError::Turn(GroundingError::Internal) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn maps_turn_errors_to_status_and_code() {
        let (status, json) = body_json(GroundingError::InvalidBackend("gpt".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "INVALID_BACKEND");
        assert!(json["message"].as_str().unwrap().contains("gpt"));

        let (status, json) = body_json(GroundingError::BackendUnavailable("primary").into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "BACKEND_UNAVAILABLE");

        let (status, json) = body_json(GroundingError::Internal.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "internal error while answering");
    }
}
