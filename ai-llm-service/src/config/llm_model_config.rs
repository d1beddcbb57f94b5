use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// This struct contains both general and provider-specific parameters.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use (Gemini, Ollama).
/// - `model`: The model identifier (e.g., `"gemini-2.5-flash"`, `"qwen3:14b"`).
/// - `endpoint`: The inference endpoint base URL.
/// - `api_key`: Optional API key for providers that require authentication.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-2.5-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("key".to_string()),
///     max_tokens: Some(1024),
///     temperature: Some(0.7),
///     top_p: Some(0.9),
///     timeout_secs: Some(30),
/// };
/// assert!(cfg.is_configured());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (base URL, no path).
    pub endpoint: String,

    /// Optional API key for authentication (Gemini).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// True when every credential the provider needs is present.
    pub fn is_configured(&self) -> bool {
        if self.model.trim().is_empty() {
            return false;
        }
        if self.provider.requires_api_key() {
            return self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(provider: LlmProvider, api_key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: "m".into(),
            endpoint: "http://localhost".into(),
            api_key: api_key.map(str::to_string),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn gemini_needs_key() {
        assert!(!base(LlmProvider::Gemini, None).is_configured());
        assert!(!base(LlmProvider::Gemini, Some("  ")).is_configured());
        assert!(base(LlmProvider::Gemini, Some("k")).is_configured());
        assert!(base(LlmProvider::Ollama, None).is_configured());
    }
}
