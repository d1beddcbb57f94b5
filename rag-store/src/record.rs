//! Core data models used by the library.

use serde_json::Value;

/// Query parameters for retrieval.
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: u64,
    pub filter: Option<RagFilter>,
}

/// A single retrieval hit.
///
/// `score` is already normalized into `(0, 1]` (see
/// [`DistanceKind::normalize_score`](crate::DistanceKind::normalize_score)).
#[derive(Clone, Debug)]
pub struct RagHit {
    /// `source_id` payload field, or the Qdrant point id.
    pub id: String,
    pub score: f32,
    pub text: String,
    /// Raw category label from the payload (`type` or `category`).
    pub category: Option<String>,
}

/// Exact-match filter combined with `must`.
#[derive(Clone, Debug, Default)]
pub struct RagFilter {
    /// Field/value pairs, e.g. `("product_id", 42)`.
    pub equals: Vec<(String, Value)>,
}

impl RagFilter {
    /// Filter with a single equality condition.
    pub fn must_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            equals: vec![(field.into(), value.into())],
        }
    }
}
