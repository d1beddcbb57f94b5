//! Typed errors for the grounding crate.

use thiserror::Error;

/// Caller-visible failures of a turn.
///
/// Messages are safe to show to end users; provider detail stays in logs.
#[derive(Debug, Error)]
pub enum GroundingError {
    /// The requested backend name is not one we serve.
    #[error("unsupported backend '{0}', only 'primary' is accepted")]
    InvalidBackend(String),

    /// The backend is known but cannot serve (not configured or unauthorized).
    #[error("backend '{0}' is currently unavailable")]
    BackendUnavailable(&'static str),

    /// Anything else; detail was logged where it happened.
    #[error("internal error while answering")]
    Internal,
}

/// Failure of a [`GenerationBackend`](crate::llm::GenerationBackend) call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Missing credentials or the provider refused us.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// Transport, status or decoding failure.
    #[error("generation failed: {0}")]
    Failed(String),
}

/// Failure of an [`EvidenceRetriever`](crate::retrieve::EvidenceRetriever) call.
#[derive(Debug, Error)]
#[error("retrieval failed: {0}")]
pub struct RetrievalError(pub String);

impl From<rag_store::RagError> for RetrievalError {
    fn from(e: rag_store::RagError) -> Self {
        Self(e.to_string())
    }
}
