//! Detection of answers that echo prompt scaffolding instead of answering.

/// Text → "is this unusable output?".
///
/// Any `Fn(&str) -> bool` is a classifier too, so callers can swap the
/// heuristic for a closure.
pub trait OutputClassifier: Send + Sync {
    fn is_garbage(&self, answer: &str) -> bool;
}

impl<F> OutputClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_garbage(&self, answer: &str) -> bool {
        self(answer)
    }
}

/// Explanatory phrase models copy from format instructions.
pub const META_PHRASE: &str = "답변 내용에 포함된 정보";

/// Fragments that only show up when a model leaks template text.
pub const RED_FLAGS: &[&str] = &[
    "[type]",
    META_PHRASE,
    "=== 답변",
    "=== 질문",
    "q:",
    "a:",
    "답변 형식",
    "(description|review|qna)",
    "description|review|qna",
    "(description|review|faq)",
    "description|review|faq",
];

/// Fixed wordlist heuristic for Korean product answers.
///
/// Garbage when the answer is blank, when two or more distinct fragments
/// occur (case-insensitive), or when [`META_PHRASE`] occurs twice.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateLeakClassifier;

impl OutputClassifier for TemplateLeakClassifier {
    fn is_garbage(&self, answer: &str) -> bool {
        if answer.trim().is_empty() {
            return true;
        }
        let lowered = answer.to_lowercase();
        let hits = RED_FLAGS.iter().filter(|f| lowered.contains(*f)).count();
        hits >= 2 || answer.matches(META_PHRASE).count() >= 2
    }
}
