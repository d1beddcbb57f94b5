use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Provider interface for query embeddings.
///
/// Async because real providers (Ollama) go over HTTP.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod ollama;
