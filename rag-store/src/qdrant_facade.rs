//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! Everything Qdrant-specific (builders, point ids, payload values) stays in
//! this module; callers receive plain JSON payloads.

use std::collections::HashMap;

use crate::config::RagConfig;
use crate::errors::RagError;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Filter, PointId, SearchParamsBuilder, SearchPointsBuilder, Value as QValue,
};
use tracing::{debug, info};

/// Raw search result: point id, raw score and JSON payload.
#[derive(Debug)]
pub struct ScoredPayload {
    pub point_id: Option<String>,
    pub score: f32,
    pub payload: serde_json::Value,
}

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
        })
    }

    /// Similarity search; results come back in Qdrant's ranking order.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
        exact: bool,
    ) -> Result<Vec<ScoredPayload>, RagError> {
        info!(
            collection = %self.collection,
            top_k,
            exact,
            filtered = filter.is_some(),
            "qdrant search"
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let out: Vec<ScoredPayload> = res
            .result
            .into_iter()
            .map(|r| ScoredPayload {
                point_id: r.id.and_then(point_id_to_string),
                score: r.score,
                payload: qpayload_to_json(r.payload),
            })
            .collect();

        debug!(hits = out.len(), "search completed");
        Ok(out)
    }
}

fn point_id_to_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(u) => Some(u),
    }
}

/// Converts a Qdrant payload into JSON. Nested structs/lists become `Null`.
fn qpayload_to_json(p: HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let m = p
        .into_iter()
        .map(|(k, v)| {
            let j = match v.kind {
                Some(K::StringValue(s)) => serde_json::Value::String(s),
                Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
                Some(K::DoubleValue(f)) => serde_json::json!(f),
                Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
                _ => serde_json::Value::Null,
            };
            (k, j)
        })
        .collect();
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::value::Kind;

    #[test]
    fn point_ids_render_as_strings() {
        let num = PointId {
            point_id_options: Some(PointIdOptions::Num(7)),
        };
        assert_eq!(point_id_to_string(num).as_deref(), Some("7"));
        assert_eq!(point_id_to_string(PointId::default()), None);
    }

    #[test]
    fn payload_scalars_are_preserved() {
        let mut p = HashMap::new();
        p.insert(
            "text".to_string(),
            QValue {
                kind: Some(Kind::StringValue("방수".into())),
            },
        );
        p.insert(
            "product_id".to_string(),
            QValue {
                kind: Some(Kind::IntegerValue(3)),
            },
        );
        let j = qpayload_to_json(p);
        assert_eq!(j["text"], "방수");
        assert_eq!(j["product_id"], 3);
    }
}
