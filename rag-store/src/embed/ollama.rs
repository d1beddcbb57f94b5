//! Embedding provider backed by the shared [`LlmServiceProfiles`] embedding profile.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::debug;

use crate::{EmbeddingsProvider, RagError};

/// Ollama embedding provider (async).
#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<LlmServiceProfiles>,
}

impl OllamaEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self
                .svc
                .embed(text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;
            debug!(dim = v.len(), "query embedded");
            Ok(v)
        })
    }
}
