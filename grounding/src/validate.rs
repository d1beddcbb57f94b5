//! Output validation and attribution.
//!
//! Models are asked for one JSON object but routinely wrap it in fences or
//! chatter. Parsing is layered: strip fences, parse everything, parse the
//! outermost `{…}` span, or give up and keep the raw text with no citations.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::api_types::{EvidencePassage, ParsedAnswer};

/// Removes a leading ```` ```lang ```` line and a trailing ```` ``` ````.
pub fn strip_code_fence(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // drop the language tag (letters, digits, '_' and '-')
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses `s` as a JSON object, then falls back to the first-`{`-to-last-`}`
/// substring.
pub fn extract_json_object(s: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(m)) = serde_json::from_str::<Value>(s) {
        return Some(m);
    }
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&s[start..=end]) {
        Ok(Value::Object(m)) => Some(m),
        _ => None,
    }
}

/// Turns raw backend text into a [`ParsedAnswer`].
///
/// The parsed `answer` is used only when it is a non-blank string; otherwise
/// the raw text stays the answer. `used_source_ids` entries are stringified
/// and blank ones dropped.
pub fn parse_generation(raw: &str) -> ParsedAnswer {
    let Some(obj) = extract_json_object(strip_code_fence(raw)) else {
        warn!("generation output is not a JSON object; sources will be hidden");
        return ParsedAnswer {
            answer: raw.trim().to_string(),
            cited: BTreeSet::new(),
        };
    };

    let answer = match obj.get("answer") {
        Some(Value::String(a)) if !a.trim().is_empty() => a.trim().to_string(),
        _ => raw.trim().to_string(),
    };

    let cited = match obj.get("used_source_ids") {
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        _ => BTreeSet::new(),
    };

    ParsedAnswer { answer, cited }
}

/// Passages whose id was cited, in evidence order. Unknown ids are ignored.
pub fn attribute(passages: &[EvidencePassage], cited: &BTreeSet<String>) -> Vec<EvidencePassage> {
    passages
        .iter()
        .filter(|p| cited.contains(&p.source_id))
        .cloned()
        .collect()
}
