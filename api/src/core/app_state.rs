use std::{path::PathBuf, sync::Arc};

use ai_llm_service::config::default_config::{config_ollama_embedding, config_primary_from_env};
use ai_llm_service::service_profiles::LlmServiceProfiles;
use axum::http::HeaderValue;
use grounding::{
    GroundingConfig, ProfileBackend, StaticCatalog, StoreRetriever, TemplateLeakClassifier,
    TurnOrchestrator,
};
use rag_store::{OllamaEmbedder, RagConfig, RagStore};
use tracing::{info, warn};

use crate::error_handler::AppError;

/// Catalog file used when `CATALOG_PATH` is not set.
const DEFAULT_CATALOG_PATH: &str = "catalog.json";

/// Timeout for `/health` checks, seconds.
const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Shop frontend dev servers, used when `CORS_ALLOW_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Answers chat turns.
    pub orchestrator: Arc<TurnOrchestrator>,
    /// LLM profiles, used here for health checks.
    pub llm: Arc<LlmServiceProfiles>,
    /// Product listing; the orchestrator holds the same catalog.
    pub catalog: Arc<StaticCatalog>,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<HeaderValue>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<TurnOrchestrator>,
        llm: Arc<LlmServiceProfiles>,
        catalog: Arc<StaticCatalog>,
    ) -> Self {
        Self {
            orchestrator,
            llm,
            catalog,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
        }
    }

    /// Wires the LLM profiles, vector store, catalog and orchestrator from
    /// environment variables.
    ///
    /// A missing Gemini key is not an error here; `/chat` answers `503`
    /// until it is configured.
    pub fn from_env() -> Result<Self, AppError> {
        let llm = Arc::new(LlmServiceProfiles::new(
            config_primary_from_env()?,
            config_ollama_embedding()?,
            Some(HEALTH_TIMEOUT_SECS),
        )?);

        let rag_cfg = RagConfig::from_env()?;
        info!(
            url = %rag_cfg.qdrant_url,
            collection = %rag_cfg.collection,
            distance = ?rag_cfg.distance,
            "vector store configured"
        );
        let store = Arc::new(RagStore::new(rag_cfg)?);
        let embedder = Arc::new(OllamaEmbedder::new(llm.clone()));
        let retriever = Arc::new(StoreRetriever::new(store, embedder));

        let catalog_path = std::env::var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH));
        let catalog = Arc::new(StaticCatalog::load_or_empty(&catalog_path));

        let cfg = GroundingConfig::from_env();
        info!(
            min_context_score = cfg.min_context_score,
            direct_answer_enabled = cfg.direct_answer_enabled,
            retrieve_top_k = cfg.retrieve_top_k,
            "grounding configured"
        );

        let orchestrator = TurnOrchestrator::new(
            cfg,
            retriever,
            Arc::new(ProfileBackend::new(llm.clone())),
            catalog.clone(),
            Arc::new(TemplateLeakClassifier),
        );

        let mut state = Self::new(Arc::new(orchestrator), llm, catalog);
        if let Ok(raw) = std::env::var("CORS_ALLOW_ORIGINS") {
            state.cors_origins = parse_origins(&raw);
        }
        info!(origins = state.cors_origins.len(), "cors configured");
        Ok(state)
    }
}

/// Comma-separated origins; blank and malformed entries are skipped.
///
/// `*` is skipped too: the layer allows credentials, which rules out a
/// wildcard origin.
pub fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            if *s == "*" {
                warn!("wildcard CORS origin is not allowed with credentials; skipping");
            }
            *s != "*"
        })
        .filter_map(|s| match HeaderValue::from_str(s) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(origin = s, error = %e, "skipping invalid CORS origin");
                None
            }
        })
        .collect()
}
