//! Confidence gate: decides whether the evidence is worth generating from.

use crate::api_types::EvidencePassage;

/// Outcome of [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    StopNoEvidence,
    StopLowConfidence,
    Proceed,
}

/// Empty set stops, a best score strictly below `min_score` stops, anything
/// else proceeds.
pub fn evaluate(passages: &[EvidencePassage], min_score: f32) -> GateDecision {
    let Some(best) = passages.iter().map(|p| p.score).reduce(f32::max) else {
        return GateDecision::StopNoEvidence;
    };
    if best < min_score {
        GateDecision::StopLowConfidence
    } else {
        GateDecision::Proceed
    }
}
