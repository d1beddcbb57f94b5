//! Retrieval facade over Qdrant.
//!
//! Embeds a query, searches one collection with an optional exact-match
//! filter and returns scored text hits.

mod config;
mod embed;
mod errors;
mod filters;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::{DistanceKind, RagConfig};
pub use embed::EmbeddingsProvider;
pub use embed::ollama::OllamaEmbedder;
pub use errors::RagError;
pub use record::{RagFilter, RagHit, RagQuery};

use tracing::trace;

/// High-level facade that wires configuration and Qdrant client.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config`/`RagError::Qdrant` if validation or client
    /// initialization fails.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!(collection = %cfg.collection, "RagStore::new");
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// Top-k hits for a textual query using the provided embedding provider.
    ///
    /// # Errors
    /// Returns embedding errors or Qdrant failures.
    pub async fn rag_context(
        &self,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, RagError> {
        retrieve::rag_context(&self.cfg, &self.client, query, provider).await
    }
}
