//! Shared LLM service with two profiles: `primary` (generation) and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_ollama_embedding, config_primary_from_env};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_primary_from_env()?,
//!     config_ollama_embedding()?,
//!     Some(10),
//! )?);
//!
//! if svc.is_primary_configured() {
//!     println!("{}", svc.generate_primary("안녕하세요").await?);
//! }
//! let emb = svc.embed("방수 기능").await?;
//! println!("Embedding dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{gemini_service::GeminiService, ollama_service::OllamaService},
};

/// Manages the **primary** generation profile and the **embedding** profile.
pub struct LlmServiceProfiles {
    primary: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    gemini: RwLock<HashMap<ClientKey, Arc<GeminiService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates the service.
    ///
    /// The embedding profile must target Ollama; Gemini embeddings are not wired.
    pub fn new(
        primary: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            primary,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            gemini: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// `true` when the primary profile has everything it needs to be called
    /// (model name, plus API key for providers that require one).
    pub fn is_primary_configured(&self) -> bool {
        self.primary.is_configured()
    }

    /// Generates text using the **primary** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if client construction or generation fails.
    pub async fn generate_primary(&self, prompt: &str) -> Result<String, AiLlmError> {
        let cfg = &self.primary;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.generate(prompt).await,
            LlmProvider::Gemini => self.gemini_for(cfg).await?.generate(prompt).await,
        }
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails or the profile is not Ollama.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        self.ollama_for(&self.embedding)
            .await?
            .embeddings(input)
            .await
    }

    /// Health snapshot for both profiles (deduplicated when identical).
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.primary.clone()];
        if self.embedding != self.primary {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /* --------------------- Internals --------------------- */

    async fn ollama_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        debug!(model = %cfg.model, "initializing Ollama client");
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn gemini_for(&self, cfg: &LlmModelConfig) -> Result<Arc<GeminiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.gemini.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.gemini.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        debug!(model = %cfg.model, "initializing Gemini client");
        let cli = Arc::new(GeminiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
