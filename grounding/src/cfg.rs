//! Runtime configuration loaded from environment variables.

use std::collections::HashSet;

use tracing::warn;

/// Query words too generic to count as lexical overlap.
pub const DEFAULT_STOP_TOKENS: &[&str] = &[
    "이", "그", "저", "것", "거", "수", "좀", "정도", "관련", "가능", "여부", "있나", "있나요",
    "있어", "있어요", "되나요", "되나", "인가", "인가요", "어떻게", "왜", "무엇", "뭐", "어떤",
    "얼마", "얼마나", "해주세요", "알려줘", "기능",
];

/// Knobs of the answering pipeline. Built once at startup and shared.
#[derive(Clone, Debug)]
pub struct GroundingConfig {
    /// Best evidence score strictly below this stops the turn.
    pub min_context_score: f32,
    /// Enables returning stored FAQ answers without generation.
    pub direct_answer_enabled: bool,
    /// Minimum score of the top FAQ passage to consider the shortcut.
    pub direct_min_score: f32,
    /// Score the top FAQ passage needs to actually skip generation.
    pub direct_strong_score: f32,
    /// Passages requested from the retriever.
    pub retrieve_top_k: usize,
    /// Follow-up questions returned with a generated answer.
    pub suggestion_top_k: usize,
    /// Lowercased tokens ignored by lexical matching.
    pub stop_tokens: HashSet<String>,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            min_context_score: 0.05,
            direct_answer_enabled: false,
            direct_min_score: 0.07,
            direct_strong_score: 0.18,
            retrieve_top_k: 5,
            suggestion_top_k: 2,
            stop_tokens: DEFAULT_STOP_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GroundingConfig {
    /// Build from environment variables with defaults.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `CHAT_MIN_CONTEXT_SCORE` | `0.05` |
    /// | `CHAT_DIRECT_QNA_ENABLED` | `false` |
    /// | `CHAT_DIRECT_QNA_MIN_SCORE` | `0.07` |
    /// | `CHAT_DIRECT_QNA_STRONG_SCORE` | `0.18` |
    /// | `CHAT_RETRIEVE_TOP_K` | `5` |
    /// | `CHAT_SUGGESTION_TOP_K` | `2` |
    /// | `CHAT_QUERY_STOP_TOKENS` | built-in list (CSV) |
    pub fn from_env() -> Self {
        Self::from_source(|k| std::env::var(k).ok())
    }

    /// Same as [`GroundingConfig::from_env`], reading values through `get`.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let stop_tokens = match get("CHAT_QUERY_STOP_TOKENS") {
            Some(csv) => csv
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => d.stop_tokens,
        };

        Self {
            min_context_score: parse(&get, "CHAT_MIN_CONTEXT_SCORE", d.min_context_score),
            direct_answer_enabled: get("CHAT_DIRECT_QNA_ENABLED")
                .map(|v| truthy(&v))
                .unwrap_or(d.direct_answer_enabled),
            direct_min_score: parse(&get, "CHAT_DIRECT_QNA_MIN_SCORE", d.direct_min_score),
            direct_strong_score: parse(&get, "CHAT_DIRECT_QNA_STRONG_SCORE", d.direct_strong_score),
            retrieve_top_k: parse(&get, "CHAT_RETRIEVE_TOP_K", d.retrieve_top_k).max(1),
            suggestion_top_k: parse(&get, "CHAT_SUGGESTION_TOP_K", d.suggestion_top_k),
            stop_tokens,
        }
    }
}

fn truthy(v: &str) -> bool {
    matches!(
        v.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn parse<T: std::str::FromStr + Copy>(get: &impl Fn(&str) -> Option<String>, k: &str, dflt: T) -> T {
    match get(k) {
        None => dflt,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!(var = k, value = %v, "unparsable value, using default");
            dflt
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> GroundingConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GroundingConfig::from_source(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = from(&[]);
        assert_eq!(c.min_context_score, 0.05);
        assert_eq!(c.direct_min_score, 0.07);
        assert_eq!(c.direct_strong_score, 0.18);
        assert!(!c.direct_answer_enabled);
        assert_eq!(c.retrieve_top_k, 5);
        assert_eq!(c.suggestion_top_k, 2);
        assert!(c.stop_tokens.contains("되나요"));
    }

    #[test]
    fn overrides_and_flag_spellings() {
        for on in ["1", "true", "YES", "y", "On"] {
            assert!(from(&[("CHAT_DIRECT_QNA_ENABLED", on)]).direct_answer_enabled);
        }
        assert!(!from(&[("CHAT_DIRECT_QNA_ENABLED", "nope")]).direct_answer_enabled);

        let c = from(&[
            ("CHAT_MIN_CONTEXT_SCORE", "0.1"),
            ("CHAT_RETRIEVE_TOP_K", "0"),
            ("CHAT_QUERY_STOP_TOKENS", " Foo, ,bar "),
        ]);
        assert_eq!(c.min_context_score, 0.1);
        assert_eq!(c.retrieve_top_k, 1);
        assert_eq!(c.stop_tokens.len(), 2);
        assert!(c.stop_tokens.contains("foo"));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let c = from(&[("CHAT_DIRECT_QNA_STRONG_SCORE", "high")]);
        assert_eq!(c.direct_strong_score, 0.18);
    }
}
