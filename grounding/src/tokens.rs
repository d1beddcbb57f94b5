//! Lexical helpers shared by the shortcut guard and the suggestion scorer.

use std::collections::HashSet;

/// Lowercased runs of letters/digits (any script) of at least two chars,
/// with stop tokens removed. Order of appearance is kept.
pub fn content_tokens(text: &str, stop: &HashSet<String>) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !stop.contains(*t))
        .map(str::to_string)
        .collect()
}

/// Number of query tokens found as substrings of `text` (lowercased).
pub fn overlap_count(query: &str, text: &str, stop: &HashSet<String>) -> usize {
    let hay = text.to_lowercase();
    content_tokens(query, stop)
        .iter()
        .filter(|t| hay.contains(t.as_str()))
        .count()
}
