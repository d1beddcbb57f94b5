//! Direct-answer shortcut: return a stored FAQ answer without generation.
//!
//! Only the single best passage is considered. It must be an FAQ entry, score
//! above both thresholds, and share at least one content token with the
//! question half of the entry. The token check guards against embedding
//! matches on an unrelated question.

use tracing::debug;

use crate::api_types::{EvidenceCategory, EvidencePassage};
use crate::cfg::GroundingConfig;
use crate::tokens::overlap_count;

/// A shortcut hit: the verbatim answer and the passage it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectAnswer<'a> {
    pub answer: String,
    pub passage: &'a EvidencePassage,
}

/// Question half of a `Q: … A: …` text.
pub fn faq_question(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("Q:")?;
    let q = rest.split_once("A:").map_or(rest, |(q, _)| q).trim();
    (!q.is_empty()).then_some(q)
}

/// Answer half of a `Q: … A: …` text.
pub fn faq_answer(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("A:")?;
    let a = rest.trim();
    (!a.is_empty()).then_some(a)
}

/// Highest-scoring passage; the earliest one wins on ties.
pub fn best_passage(passages: &[EvidencePassage]) -> Option<&EvidencePassage> {
    passages
        .iter()
        .fold(None, |best: Option<&EvidencePassage>, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
}

/// Returns the stored answer when every shortcut condition holds.
pub fn try_direct_answer<'a>(
    query: &str,
    passages: &'a [EvidencePassage],
    cfg: &GroundingConfig,
) -> Option<DirectAnswer<'a>> {
    if !cfg.direct_answer_enabled {
        return None;
    }
    let best = best_passage(passages)?;
    if best.category != EvidenceCategory::Faq || best.score < cfg.direct_min_score {
        return None;
    }

    let question = faq_question(&best.text).unwrap_or_default();
    if overlap_count(query, question, &cfg.stop_tokens) == 0 {
        debug!(source_id = %best.source_id, "faq question shares no token with query");
        return None;
    }
    if best.score < cfg.direct_strong_score {
        debug!(source_id = %best.source_id, score = best.score, "faq match below strong bar");
        return None;
    }

    let answer = faq_answer(&best.text)?;
    Some(DirectAnswer {
        answer: answer.to_string(),
        passage: best,
    })
}
