//! Filter conversion to Qdrant `Filter`.
//!
//! Supports exact equality on scalar fields (`String`, `Number`, `Bool`).
//! All conditions are combined with `must`, so every pair has to match.

use crate::record::RagFilter;
use qdrant_client::qdrant::r#match::MatchValue;
use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match, condition::ConditionOneOf};
use tracing::debug;

/// Converts [`RagFilter`] to a Qdrant [`Filter`].
///
/// - `String` → `Keyword`
/// - `Number` → `Integer` (non-integers are skipped)
/// - `Bool`   → `Boolean`
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!(equals = f.equals.len(), "filters::to_qdrant_filter");

    let must = f
        .equals
        .iter()
        .filter_map(|(field, val)| {
            let value = match val {
                serde_json::Value::String(s) => MatchValue::Keyword(s.clone()),
                serde_json::Value::Number(n) => MatchValue::Integer(n.as_i64()?),
                serde_json::Value::Bool(b) => MatchValue::Boolean(*b),
                _ => return None,
            };
            Some(Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: field.clone(),
                    r#match: Some(Match {
                        match_value: Some(value),
                    }),
                    ..Default::default()
                })),
            })
        })
        .collect();

    Filter {
        must,
        ..Default::default()
    }
}
