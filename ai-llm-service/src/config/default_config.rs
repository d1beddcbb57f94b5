//! Default LLM configs loaded strictly from environment variables.
//!
//! This module provides convenience constructors for [`LlmModelConfig`],
//! grouped by provider and role. Two roles exist:
//!
//! - **Primary**   → the single generation model answering user questions
//! - **Embedding** → embedding generator used by retrieval (always Ollama)
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider of the primary profile (`gemini` default, `ollama`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//!
//! Gemini-specific:
//! - `GEMINI_API_KEY` = API key (optional at boot; without it the backend reports unavailable)
//! - `GEMINI_MODEL`   = model name (default `gemini-2.5-flash`)
//! - `GEMINI_URL`     = API base (default `https://generativelanguage.googleapis.com`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory for Ollama roles)
//! - `OLLAMA_MODEL`                = generation model (mandatory when `LLM_KIND=ollama`)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, must_env, opt_env, validate_http_endpoint,
    },
};

/// Default Gemini API base.
pub const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";
/// Default Gemini model.
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        let _ = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Builds the **primary** generation profile for the provider named by `LLM_KIND`.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for unknown `LLM_KIND` values
/// - errors of the provider-specific constructor
pub fn config_primary_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let kind = opt_env("LLM_KIND")
        .map(|k| k.parse::<LlmProvider>())
        .transpose()?
        .unwrap_or(LlmProvider::Gemini);

    match kind {
        LlmProvider::Gemini => config_gemini_primary(),
        LlmProvider::Ollama => config_ollama_primary(),
    }
}

/// Constructs the Gemini primary profile.
///
/// A missing `GEMINI_API_KEY` is not an error here: the service boots, and
/// every turn reports the backend as unavailable until a key is provided.
///
/// # Defaults
/// - `temperature = Some(0.7)`, `top_p = Some(0.9)`
/// - `max_tokens = Some(1024)` unless `LLM_MAX_TOKENS` is set
/// - `timeout_secs = Some(30)`
pub fn config_gemini_primary() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = opt_env("GEMINI_URL").unwrap_or_else(|| GEMINI_DEFAULT_URL.to_string());
    validate_http_endpoint("GEMINI_URL", &endpoint)?;
    let model = opt_env("GEMINI_MODEL").unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.or(Some(1024));

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: opt_env("GEMINI_API_KEY"),
        max_tokens,
        temperature: Some(0.7),
        top_p: Some(0.9),
        timeout_secs: Some(30),
    })
}

/// Constructs the Ollama primary profile.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(120)`
pub fn config_ollama_primary() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(120),
    })
}

/// Constructs a config for the **embedding** Ollama model.
///
/// # Env
/// - `EMBEDDING_MODEL` (required)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `max_tokens = None`
/// - `timeout_secs = Some(30)`
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("EMBEDDING_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}
