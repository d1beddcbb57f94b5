//! Retrieval: embed the query, search Qdrant and map payloads into hits.

use crate::config::{DistanceKind, RagConfig};
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::{QdrantFacade, ScoredPayload};
use crate::record::{RagHit, RagQuery};

use serde_json::Value;
use tracing::{trace, warn};

/// Embeds the query text and returns hits with normalized scores.
///
/// Hits whose payload carries no text are dropped.
///
/// # Errors
/// Returns embedding/provider errors or Qdrant failures.
pub async fn rag_context(
    cfg: &RagConfig,
    client: &QdrantFacade,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, RagError> {
    trace!(
        top_k = query.top_k,
        filtered = query.filter.is_some(),
        "retrieve::rag_context"
    );

    let qv = provider.embed(query.text).await?;
    if cfg.embedding_dim != 0 && qv.len() != cfg.embedding_dim {
        return Err(RagError::VectorSizeMismatch {
            got: qv.len(),
            want: cfg.embedding_dim,
        });
    }

    let filter = query.filter.as_ref().map(to_qdrant_filter);
    let raw = client
        .search(qv, query.top_k, filter, cfg.exact_search)
        .await?;

    let total = raw.len();
    let out: Vec<RagHit> = raw
        .into_iter()
        .filter_map(|r| hit_from_scored(r, cfg.distance))
        .collect();

    if out.len() < total {
        warn!(dropped = total - out.len(), "hits without text were dropped");
    }
    trace!(hits = out.len(), "retrieve::rag_context done");
    Ok(out)
}

fn str_field<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn hit_from_scored(r: ScoredPayload, distance: DistanceKind) -> Option<RagHit> {
    let text = str_field(&r.payload, &["text", "content"])?.to_string();
    let category = str_field(&r.payload, &["type", "category"]).map(str::to_string);

    let id = match r.payload.get("source_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
    .or(r.point_id)?;

    Some(RagHit {
        id,
        score: distance.normalize_score(r.score),
        text,
        category,
    })
}
