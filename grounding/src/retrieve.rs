//! Evidence retrieval seam and its Qdrant-backed implementation.

use std::{future::Future, pin::Pin, sync::Arc};

use rag_store::{EmbeddingsProvider, RagFilter, RagHit, RagQuery, RagStore};
use tracing::{debug, warn};

use crate::api_types::{EvidenceCategory, EvidencePassage};
use crate::error::RetrievalError;

/// Payload field holding the item id in the vector collection.
pub const ITEM_ID_FIELD: &str = "product_id";

/// Ranked passages for a query, scoped to one item.
pub trait EvidenceRetriever: Send + Sync {
    fn retrieve<'a>(
        &'a self,
        query: &'a str,
        item_id: i64,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EvidencePassage>, RetrievalError>> + Send + 'a>>;
}

/// [`EvidenceRetriever`] over a [`RagStore`] and an embedding provider.
pub struct StoreRetriever {
    store: Arc<RagStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl StoreRetriever {
    pub fn new(store: Arc<RagStore>, embedder: Arc<dyn EmbeddingsProvider>) -> Self {
        Self { store, embedder }
    }
}

impl EvidenceRetriever for StoreRetriever {
    fn retrieve<'a>(
        &'a self,
        query: &'a str,
        item_id: i64,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EvidencePassage>, RetrievalError>> + Send + 'a>>
    {
        Box::pin(async move {
            let q = RagQuery {
                text: query,
                top_k: top_k as u64,
                filter: Some(RagFilter::must_equal(ITEM_ID_FIELD, item_id)),
            };
            let hits = self.store.rag_context(q, self.embedder.as_ref()).await?;
            debug!(item_id, hits = hits.len(), "evidence retrieved");
            Ok(hits.into_iter().filter_map(passage_from_hit).collect())
        })
    }
}

/// Hits with an unknown category label are skipped.
fn passage_from_hit(hit: RagHit) -> Option<EvidencePassage> {
    let label = hit.category.as_deref().unwrap_or_default();
    let Some(category) = EvidenceCategory::from_label(label) else {
        warn!(source_id = %hit.id, label, "skipping hit with unknown category");
        return None;
    };
    Some(EvidencePassage {
        source_id: hit.id,
        category,
        text: hit.text,
        score: hit.score,
    })
}
