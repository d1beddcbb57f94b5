use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between the hosted Gemini API and a local Ollama
/// runtime.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// ```
///
/// Adding more providers in the future can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// Google Generative Language API (Gemini).
    Gemini,
}

impl LlmProvider {
    /// Whether calls to this provider need an API key.
    pub fn requires_api_key(self) -> bool {
        matches!(self, LlmProvider::Gemini)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    /// Parses values of `LLM_KIND` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("openai".parse::<LlmProvider>().is_err());
    }
}
