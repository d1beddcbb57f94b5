use serde::Deserialize;

fn default_backend() -> String {
    "primary".to_string()
}

/// Request payload for `POST /chat`.
///
/// The older field names `product_id`, `engine` and `conversation_history`
/// are accepted as aliases.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Customer question.
    pub query: String,
    /// Item the question is about; retrieval is scoped to it.
    #[serde(alias = "product_id")]
    pub item_id: i64,
    /// Generation backend name; only `primary` is served.
    #[serde(default = "default_backend", alias = "engine")]
    pub backend: String,
    /// Questions already asked in this conversation, excluded from suggestions.
    #[serde(default, alias = "conversation_history")]
    pub asked_questions: Vec<String>,
}
