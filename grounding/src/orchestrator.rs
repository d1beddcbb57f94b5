//! Turn orchestrator: one request in, one grounded answer out.
//!
//! ```text
//! RETRIEVE -> GATE -> STOP
//!                  -> SHORTCUT -> RESPOND
//!                  -> GENERATE -> VALIDATE -> STOP (garbage)
//!                                          -> RESPOND
//! ```
//!
//! Every state is entered at most once; generation is never retried here.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use crate::api_types::{ChatTurnResponse, EvidencePassage};
use crate::catalog::ItemCatalog;
use crate::cfg::GroundingConfig;
use crate::error::{GenerationError, GroundingError};
use crate::gate::{self, GateDecision};
use crate::garbage::OutputClassifier;
use crate::llm::{BackendName, GenerationBackend};
use crate::prompt::build_prompt;
use crate::retrieve::EvidenceRetriever;
use crate::shortcut::try_direct_answer;
use crate::suggest::suggest_related_questions;
use crate::validate::{attribute, parse_generation};

/// Fixed answer whenever the turn cannot be grounded.
pub const REFUSAL_TEXT: &str = "제공된 상품 정보에서 답변할 근거를 찾지 못해 정확히 안내드리기 어렵습니다. 상품 상세 페이지의 Q&A에 질문을 남겨주시면 확인 후 답변드릴게요.";

/// Why a turn ended with the refusal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    NoEvidence,
    LowConfidence,
    Garbage,
    EmptyOutput,
}

enum TurnState {
    Retrieve,
    Gate(Vec<EvidencePassage>),
    Shortcut {
        answer: String,
        passage: EvidencePassage,
    },
    Generate(Vec<EvidencePassage>),
    Validate {
        evidence: Vec<EvidencePassage>,
        raw: String,
    },
    Stop(StopReason),
    Respond(ChatTurnResponse),
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            TurnState::Retrieve => "retrieve",
            TurnState::Gate(_) => "gate",
            TurnState::Shortcut { .. } => "shortcut",
            TurnState::Generate(_) => "generate",
            TurnState::Validate { .. } => "validate",
            TurnState::Stop(_) => "stop",
            TurnState::Respond(_) => "respond",
        }
    }
}

/// Per-turn input.
struct Turn<'a> {
    query: &'a str,
    item_id: i64,
    backend: BackendName,
    asked: &'a [String],
}

/// Sequences retrieval, gating, generation and validation.
///
/// Holds only shared read-only collaborators; wrap in `Arc` and share
/// across request handlers.
pub struct TurnOrchestrator {
    cfg: GroundingConfig,
    retriever: Arc<dyn EvidenceRetriever>,
    primary: Arc<dyn GenerationBackend>,
    catalog: Arc<dyn ItemCatalog>,
    classifier: Arc<dyn OutputClassifier>,
}

impl TurnOrchestrator {
    pub fn new(
        cfg: GroundingConfig,
        retriever: Arc<dyn EvidenceRetriever>,
        primary: Arc<dyn GenerationBackend>,
        catalog: Arc<dyn ItemCatalog>,
        classifier: Arc<dyn OutputClassifier>,
    ) -> Self {
        Self {
            cfg,
            retriever,
            primary,
            catalog,
            classifier,
        }
    }

    fn backend(&self, name: BackendName) -> &dyn GenerationBackend {
        match name {
            BackendName::Primary => self.primary.as_ref(),
        }
    }

    /// Answers one question about one item.
    ///
    /// # Errors
    /// - [`GroundingError::InvalidBackend`] for any name other than `primary`
    /// - [`GroundingError::BackendUnavailable`] when the backend cannot serve
    /// - [`GroundingError::Internal`] for every other failure (logged here)
    #[instrument(skip_all, fields(item_id = item_id, backend = %backend_name))]
    pub async fn handle_turn(
        &self,
        query: &str,
        item_id: i64,
        backend_name: &str,
        asked_questions: &[String],
    ) -> Result<ChatTurnResponse, GroundingError> {
        let backend: BackendName = backend_name.parse()?;
        if !self.backend(backend).is_available() {
            warn!(%backend, "backend not configured; rejecting turn");
            return Err(GroundingError::BackendUnavailable(backend.as_str()));
        }

        let turn = Turn {
            query,
            item_id,
            backend,
            asked: asked_questions,
        };

        let started = Instant::now();
        let mut path = Vec::with_capacity(5);
        let mut state = TurnState::Retrieve;
        loop {
            path.push(state.name());
            state = match state {
                TurnState::Stop(reason) => {
                    info!(?reason, ?path, latency_ms = started.elapsed().as_millis(), "turn refused");
                    return Ok(refusal(&turn));
                }
                TurnState::Respond(resp) => {
                    info!(
                        ?path,
                        sources = resp.sources.len(),
                        suggestions = resp.suggested_questions.len(),
                        latency_ms = started.elapsed().as_millis(),
                        "turn answered"
                    );
                    return Ok(resp);
                }
                other => self.step(other, &turn).await?,
            };
        }
    }

    async fn step(&self, state: TurnState, turn: &Turn<'_>) -> Result<TurnState, GroundingError> {
        let next = match state {
            TurnState::Retrieve => {
                let raw = self
                    .retriever
                    .retrieve(turn.query, turn.item_id, self.cfg.retrieve_top_k)
                    .await
                    .map_err(|e| {
                        error!(error = %e, item_id = turn.item_id, "retrieval failed");
                        GroundingError::Internal
                    })?;
                TurnState::Gate(normalize_evidence(raw, self.cfg.retrieve_top_k))
            }

            TurnState::Gate(evidence) => {
                match gate::evaluate(&evidence, self.cfg.min_context_score) {
                    GateDecision::StopNoEvidence => TurnState::Stop(StopReason::NoEvidence),
                    GateDecision::StopLowConfidence => TurnState::Stop(StopReason::LowConfidence),
                    GateDecision::Proceed => {
                        let direct = try_direct_answer(turn.query, &evidence, &self.cfg)
                            .map(|hit| (hit.answer, hit.passage.clone()));
                        match direct {
                            Some((answer, passage)) => TurnState::Shortcut { answer, passage },
                            None => TurnState::Generate(evidence),
                        }
                    }
                }
            }

            TurnState::Shortcut { answer, passage } => {
                info!(source_id = %passage.source_id, "answering from stored faq");
                TurnState::Respond(ChatTurnResponse {
                    answer,
                    sources: vec![passage],
                    suggested_questions: Vec::new(),
                    item_id: turn.item_id,
                    backend: turn.backend,
                })
            }

            TurnState::Generate(evidence) => {
                let prompt = build_prompt(turn.query, &evidence, turn.item_id);
                let raw = self
                    .backend(turn.backend)
                    .generate(&prompt)
                    .await
                    .map_err(|e| match e {
                        GenerationError::Unavailable(detail) => {
                            warn!(%detail, "generation backend refused the call");
                            GroundingError::BackendUnavailable(turn.backend.as_str())
                        }
                        GenerationError::Failed(detail) => {
                            error!(%detail, "generation failed");
                            GroundingError::Internal
                        }
                    })?;
                TurnState::Validate { evidence, raw }
            }

            TurnState::Validate { evidence, raw } => {
                let parsed = parse_generation(&raw);
                if parsed.answer.is_empty() {
                    warn!("generation returned no text");
                    TurnState::Stop(StopReason::EmptyOutput)
                } else if self.classifier.is_garbage(&parsed.answer) {
                    warn!(answer_len = parsed.answer.len(), "generation echoed template text");
                    TurnState::Stop(StopReason::Garbage)
                } else {
                    let sources = attribute(&evidence, &parsed.cited);
                    let item = self.catalog.lookup_item(turn.item_id).await;
                    let suggested_questions = suggest_related_questions(
                        turn.query,
                        item.as_ref(),
                        turn.asked,
                        self.cfg.suggestion_top_k,
                        &self.cfg.stop_tokens,
                    );
                    TurnState::Respond(ChatTurnResponse {
                        answer: parsed.answer,
                        sources,
                        suggested_questions,
                        item_id: turn.item_id,
                        backend: turn.backend,
                    })
                }
            }

            terminal @ (TurnState::Stop(_) | TurnState::Respond(_)) => terminal,
        };
        Ok(next)
    }
}

fn refusal(turn: &Turn<'_>) -> ChatTurnResponse {
    ChatTurnResponse {
        answer: REFUSAL_TEXT.to_string(),
        sources: Vec::new(),
        suggested_questions: Vec::new(),
        item_id: turn.item_id,
        backend: turn.backend,
    }
}

/// Descending by score (stable), first occurrence of each id, at most `top_k`.
pub fn normalize_evidence(mut raw: Vec<EvidencePassage>, top_k: usize) -> Vec<EvidencePassage> {
    raw.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut seen = HashSet::new();
    raw.retain(|p| seen.insert(p.source_id.clone()));
    raw.truncate(top_k);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::api_types::EvidenceCategory;
    use crate::catalog::{ItemInfo, StaticCatalog};
    use crate::error::RetrievalError;
    use crate::garbage::{META_PHRASE, TemplateLeakClassifier};

    struct FakeRetriever {
        result: Mutex<Option<Result<Vec<EvidencePassage>, RetrievalError>>>,
        calls: AtomicUsize,
    }

    impl FakeRetriever {
        fn new(evidence: Vec<EvidencePassage>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Ok(evidence))),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Err(RetrievalError("qdrant down".into())))),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl EvidenceRetriever for FakeRetriever {
        fn retrieve<'a>(
            &'a self,
            _query: &'a str,
            _item_id: i64,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<EvidencePassage>, RetrievalError>> + Send + 'a>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let out = self
                .result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { out })
        }
    }

    struct FakeBackend {
        available: bool,
        reply: Mutex<Option<Result<String, GenerationError>>>,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn replying(text: &str) -> Arc<Self> {
            Self::with(true, Ok(text.to_string()))
        }

        fn with(available: bool, reply: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self {
                available,
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl GenerationBackend for FakeBackend {
        fn is_available(&self) -> bool {
            self.available
        }

        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let out = self
                .reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(GenerationError::Failed("called twice".into())));
            Box::pin(async move { out })
        }
    }

    fn passage(id: &str, category: EvidenceCategory, score: f32, text: &str) -> EvidencePassage {
        EvidencePassage {
            source_id: id.into(),
            category,
            text: text.into(),
            score,
        }
    }

    fn catalog() -> Arc<StaticCatalog> {
        Arc::new(StaticCatalog::new([(
            1,
            ItemInfo {
                name: "무선 이어폰".into(),
                ..Default::default()
            },
        )]))
    }

    fn orchestrator(
        cfg: GroundingConfig,
        retriever: Arc<FakeRetriever>,
        backend: Arc<FakeBackend>,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(
            cfg,
            retriever,
            backend,
            catalog(),
            Arc::new(TemplateLeakClassifier),
        )
    }

    fn assert_refusal(resp: &ChatTurnResponse) {
        assert_eq!(resp.answer, REFUSAL_TEXT);
        assert!(resp.sources.is_empty());
        assert!(resp.suggested_questions.is_empty());
    }

    #[tokio::test]
    async fn scenario_a_no_evidence_refuses_without_generation() {
        let backend = FakeBackend::replying("unused");
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(vec![]), backend.clone());

        let resp = o.handle_turn("방수 되나요?", 1, "primary", &[]).await.unwrap();
        assert_refusal(&resp);
        assert_eq!(resp.item_id, 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scenario_b_low_confidence_hides_evidence() {
        let backend = FakeBackend::replying("unused");
        let ev = vec![passage("d1", EvidenceCategory::Description, 0.02, "...")];
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev), backend.clone());

        let resp = o.handle_turn("방수 되나요?", 1, "primary", &[]).await.unwrap();
        assert_refusal(&resp);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scenario_c_shortcut_returns_stored_answer() {
        let backend = FakeBackend::replying("unused");
        let faq = passage(
            "q1",
            EvidenceCategory::Faq,
            0.22,
            "Q: 방수 기능이 있나요?\nA: 네, IPX7 등급입니다.",
        );
        let cfg = GroundingConfig {
            direct_answer_enabled: true,
            ..GroundingConfig::default()
        };
        let o = orchestrator(cfg, FakeRetriever::new(vec![faq.clone()]), backend.clone());

        let resp = o.handle_turn("방수 되나요?", 1, "primary", &[]).await.unwrap();
        assert_eq!(resp.answer, "네, IPX7 등급입니다.");
        assert_eq!(resp.sources, vec![faq]);
        assert!(resp.suggested_questions.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shortcut_disabled_goes_through_generation() {
        let faq = passage(
            "q1",
            EvidenceCategory::Faq,
            0.9,
            "Q: 방수 기능이 있나요?\nA: 네, IPX7 등급입니다.",
        );
        let backend = FakeBackend::replying(r#"{"answer":"네, 방수됩니다.","used_source_ids":["q1"]}"#);
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(vec![faq]), backend.clone());

        let resp = o.handle_turn("방수 되나요?", 1, "primary", &[]).await.unwrap();
        assert_eq!(resp.answer, "네, 방수됩니다.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scenario_d_sources_are_limited_to_cited_ids() {
        let ev = vec![
            passage("p1", EvidenceCategory::Description, 0.3, "배터리 8시간"),
            passage("p2", EvidenceCategory::Review, 0.2, "가벼워요"),
        ];
        let backend = FakeBackend::replying(
            r#"{"answer":"배터리는 8시간 지속됩니다.","used_source_ids":["p1"]}"#,
        );
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev.clone()), backend);

        let asked = vec!["무선 이어폰 핵심 특징을 알려주세요".to_string()];
        let resp = o.handle_turn("배터리 얼마나 가나요?", 1, "primary", &asked).await.unwrap();
        assert_eq!(resp.answer, "배터리는 8시간 지속됩니다.");
        assert_eq!(resp.sources, vec![ev[0].clone()]);
        assert_eq!(resp.backend, BackendName::Primary);
        assert_eq!(resp.suggested_questions.len(), 2);
        assert!(!resp.suggested_questions.contains(&asked[0]));
    }

    #[tokio::test]
    async fn scenario_e_repeated_meta_phrase_is_replaced() {
        let ev = vec![passage("p1", EvidenceCategory::Description, 0.3, "배터리 8시간")];
        let raw = format!("{META_PHRASE}: 배터리. {META_PHRASE}: 무게.");
        let backend = FakeBackend::replying(&raw);
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev), backend);

        let resp = o.handle_turn("배터리?", 1, "primary", &[]).await.unwrap();
        assert_refusal(&resp);
    }

    #[tokio::test]
    async fn parsed_answer_with_template_fragments_is_replaced() {
        let ev = vec![passage("p1", EvidenceCategory::Description, 0.3, "배터리 8시간")];
        let raw = "```json\n{\"answer\":\"[type] === 답변\",\"used_source_ids\":[\"p1\"]}\n```";
        let backend = FakeBackend::replying(raw);
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev), backend);

        let resp = o.handle_turn("배터리?", 1, "primary", &[]).await.unwrap();
        assert_eq!(resp.answer, REFUSAL_TEXT);
        assert!(resp.sources.is_empty());
        assert!(resp.suggested_questions.is_empty());
    }

    #[tokio::test]
    async fn unparsable_output_hides_sources() {
        let ev = vec![passage("p1", EvidenceCategory::Description, 0.3, "배터리 8시간")];
        let backend = FakeBackend::replying("배터리는 8시간 갑니다.");
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev), backend);

        let resp = o.handle_turn("배터리?", 1, "primary", &[]).await.unwrap();
        assert_eq!(resp.answer, "배터리는 8시간 갑니다.");
        assert!(resp.sources.is_empty());
    }

    #[tokio::test]
    async fn blank_output_becomes_refusal() {
        let ev = vec![passage("p1", EvidenceCategory::Description, 0.3, "배터리 8시간")];
        let backend = FakeBackend::replying("  \n ");
        let o = orchestrator(GroundingConfig::default(), FakeRetriever::new(ev), backend);

        let resp = o.handle_turn("배터리?", 1, "primary", &[]).await.unwrap();
        assert_eq!(resp.answer, REFUSAL_TEXT);
        assert!(resp.sources.is_empty());
        assert!(resp.suggested_questions.is_empty());
    }

    #[tokio::test]
    async fn invalid_backend_is_rejected_before_retrieval() {
        let retriever = FakeRetriever::new(vec![]);
        let o = orchestrator(
            GroundingConfig::default(),
            retriever.clone(),
            FakeBackend::replying("x"),
        );

        let err = o.handle_turn("q", 1, "gemini", &[]).await.unwrap_err();
        assert!(matches!(err, GroundingError::InvalidBackend(ref n) if n == "gemini"));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_backend_is_rejected_before_retrieval() {
        let retriever = FakeRetriever::new(vec![]);
        let o = orchestrator(
            GroundingConfig::default(),
            retriever.clone(),
            FakeBackend::with(false, Ok("x".into())),
        );

        let err = o.handle_turn("q", 1, "primary", &[]).await.unwrap_err();
        assert!(matches!(err, GroundingError::BackendUnavailable("primary")));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_map_to_opaque_errors() {
        let ev = vec![passage("p1", EvidenceCategory::Description, 0.3, "x")];

        let o = orchestrator(
            GroundingConfig::default(),
            FakeRetriever::failing(),
            FakeBackend::replying("x"),
        );
        let err = o.handle_turn("q", 1, "primary", &[]).await.unwrap_err();
        assert!(matches!(err, GroundingError::Internal));
        assert!(!err.to_string().contains("qdrant"));

        let o = orchestrator(
            GroundingConfig::default(),
            FakeRetriever::new(ev.clone()),
            FakeBackend::with(true, Err(GenerationError::Failed("HTTP 500 secret".into()))),
        );
        let err = o.handle_turn("q", 1, "primary", &[]).await.unwrap_err();
        assert!(matches!(err, GroundingError::Internal));

        let o = orchestrator(
            GroundingConfig::default(),
            FakeRetriever::new(ev),
            FakeBackend::with(true, Err(GenerationError::Unavailable("401".into()))),
        );
        let err = o.handle_turn("q", 1, "primary", &[]).await.unwrap_err();
        assert!(matches!(err, GroundingError::BackendUnavailable(_)));
    }

    #[test]
    fn evidence_is_sorted_deduped_and_truncated() {
        let raw = vec![
            passage("a", EvidenceCategory::Review, 0.1, "x"),
            passage("b", EvidenceCategory::Review, 0.5, "x"),
            passage("a", EvidenceCategory::Review, 0.9, "dup"),
            passage("c", EvidenceCategory::Review, 0.5, "x"),
        ];
        let out = normalize_evidence(raw, 2);
        let ids: Vec<_> = out.iter().map(|p| (p.source_id.as_str(), p.text.as_str())).collect();
        assert_eq!(ids, vec![("a", "dup"), ("b", "x")]);
    }
}
