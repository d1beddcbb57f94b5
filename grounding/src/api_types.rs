//! Public types shared with the HTTP layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::llm::BackendName;

/// Kind of text a passage was cut from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceCategory {
    Description,
    Review,
    /// Stored question/answer pair, `Q: … A: …`.
    #[serde(alias = "qna")]
    Faq,
}

impl EvidenceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceCategory::Description => "description",
            EvidenceCategory::Review => "review",
            EvidenceCategory::Faq => "faq",
        }
    }

    /// Parses a payload label; `qna` is the legacy name of `faq`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "description" => Some(EvidenceCategory::Description),
            "review" => Some(EvidenceCategory::Review),
            "faq" | "qna" => Some(EvidenceCategory::Faq),
            _ => None,
        }
    }
}

/// One retrieved passage. Immutable for the lifetime of a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidencePassage {
    pub source_id: String,
    pub category: EvidenceCategory,
    pub text: String,
    /// Relevance in `(0, 1]`, higher is better.
    pub score: f32,
}

/// Generation output after validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub answer: String,
    /// Source ids the model says it relied on. Empty when parsing failed.
    pub cited: BTreeSet<String>,
}

/// Final answer of one turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatTurnResponse {
    pub answer: String,
    pub sources: Vec<EvidencePassage>,
    pub suggested_questions: Vec<String>,
    pub item_id: i64,
    pub backend: BackendName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faq_accepts_legacy_label() {
        let c: EvidenceCategory = serde_json::from_str("\"qna\"").unwrap();
        assert_eq!(c, EvidenceCategory::Faq);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"faq\"");
        assert_eq!(EvidenceCategory::from_label(" QnA "), Some(EvidenceCategory::Faq));
        assert_eq!(EvidenceCategory::from_label("manual"), None);
    }
}
