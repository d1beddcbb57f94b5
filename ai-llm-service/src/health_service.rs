//! Health checks for LLM backends (Ollama, Gemini).
//!
//! - Ollama: `GET {endpoint}/api/tags`, then a best-effort model existence check
//! - Gemini: `GET {endpoint}/v1beta/models/{model}` with the `x-goog-api-key` header
//!
//! [`HealthService::check`] never fails: errors become `ok = false` so the
//! result can be returned from `/health` as is.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "Gemini").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier the check was about.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main request.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks one config, routing to the provider-specific check.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        if !cfg.is_configured() {
            return HealthStatus::new(cfg, false, 0, "not configured (model or API key missing)");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_check_ollama(cfg).await,
            LlmProvider::Gemini => self.try_check_gemini(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health check completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    model = %cfg.model,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health check failed"
                );
                status
            }
        }
    }

    /// Checks several configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health checks");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn try_check_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        let started = Instant::now();
        debug!(provider = "Ollama", model = %cfg.model, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .send()
            .await?;
        let latency = started.elapsed().as_millis();

        if !resp.status().is_success() {
            return Err(http_failure(resp, url).await);
        }

        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let tags = resp
            .json::<Tags>()
            .await
            .map_err(|e| HealthError::Decode(e.to_string()))?;

        let status = match tags.models {
            Some(models) if models.iter().any(|m| m.name == cfg.model) => {
                HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available")
            }
            Some(_) => HealthStatus::new(
                cfg,
                false,
                latency,
                "Ollama is up, but model not found in /api/tags",
            ),
            None => HealthStatus::new(cfg, true, latency, "Ollama is healthy"),
        };
        Ok(status)
    }

    async fn try_check_gemini(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!(
            "{}/v1beta/models/{}",
            cfg.endpoint.trim_end_matches('/'),
            cfg.model
        );
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing Gemini API key".into()))?;

        let started = Instant::now();
        debug!(provider = "Gemini", model = %cfg.model, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .header("x-goog-api-key", api_key)
            .send()
            .await?;
        let latency = started.elapsed().as_millis();

        if !resp.status().is_success() {
            return Err(http_failure(resp, url).await);
        }

        Ok(HealthStatus::new(
            cfg,
            true,
            latency,
            "Gemini is healthy; model is available",
        ))
    }

    fn timeout_for(&self, cfg: &LlmModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .map_or(self.default_timeout, |t| t.min(self.default_timeout))
    }
}

async fn http_failure(resp: reqwest::Response, url: String) -> AiLlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    HealthError::HttpStatus(HttpError {
        status,
        url,
        snippet: make_snippet(&text),
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_gemini_reports_not_ok_without_network() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.provider, "Gemini");
        assert_eq!(status.latency_ms, 0);
    }
}
