//! Runtime and collection configuration.

use std::str::FromStr;

use crate::errors::RagError;

/// Distance function configured on the collection.
///
/// Determines how a raw Qdrant score is turned into a similarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine (score is a similarity in `[-1, 1]`).
    Cosine,
    /// Dot product (score is a similarity).
    Dot,
    /// Euclidean distance (score is a distance, lower is closer).
    Euclid,
}

impl DistanceKind {
    /// Maps a raw Qdrant score into `(0, 1]`, higher meaning more relevant.
    ///
    /// The raw value is first read as a distance (Euclid as is, similarities
    /// as `1 - s` floored at zero), then squashed with `1 / (1 + distance)`.
    pub fn normalize_score(self, raw: f32) -> f32 {
        let distance = match self {
            DistanceKind::Euclid => raw.max(0.0),
            DistanceKind::Cosine | DistanceKind::Dot => (1.0 - raw).max(0.0),
        };
        1.0 / (1.0 + distance)
    }
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(RagError::Config(format!("unknown distance '{other}'"))),
        }
    }
}

/// Configuration for retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function of the collection.
    pub distance: DistanceKind,
    /// Expected embedding dimension; `0` disables the check.
    pub embedding_dim: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl RagConfig {
    /// Config with defaults for a given endpoint and collection.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Euclid,
            embedding_dim: 0,
            exact_search: false,
        }
    }

    /// Reads the config from the process environment.
    ///
    /// - `QDRANT_URL` (default `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default `product_evidence`)
    /// - `QDRANT_DISTANCE` (`euclid` default, `cosine`, `dot`)
    /// - `EMBEDDING_DIM` (default `0`, no check)
    /// - `RAG_EXACT_SEARCH` (`true`/`1` to enable)
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_source(|k| std::env::var(k).ok())
    }

    /// Same as [`RagConfig::from_env`] with an injectable lookup.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, RagError> {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let mut cfg = Self::new_default(
            get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".into()),
            get("QDRANT_COLLECTION").unwrap_or_else(|| "product_evidence".into()),
        );
        cfg.qdrant_api_key = get("QDRANT_API_KEY");
        if let Some(d) = get("QDRANT_DISTANCE") {
            cfg.distance = d.parse()?;
        }
        if let Some(dim) = get("EMBEDDING_DIM") {
            cfg.embedding_dim = dim
                .trim()
                .parse()
                .map_err(|_| RagError::Config(format!("EMBEDDING_DIM is not a number: {dim}")))?;
        }
        cfg.exact_search = get("RAG_EXACT_SEARCH")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        Ok(())
    }
}
