//! Evidence-grounded answering for product questions.
//!
//! [`TurnOrchestrator::handle_turn`] retrieves passages for one item, refuses
//! when the evidence is weak, optionally returns a stored FAQ answer, and
//! otherwise asks the generation backend for a JSON answer that is parsed,
//! screened for leaked template text and attributed back to the passages it
//! cites.

pub mod api_types;
pub mod catalog;
pub mod cfg;
pub mod error;
pub mod garbage;
pub mod gate;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod retrieve;
pub mod shortcut;
pub mod suggest;
pub mod tokens;
pub mod validate;

pub use api_types::{ChatTurnResponse, EvidenceCategory, EvidencePassage, ParsedAnswer};
pub use catalog::{ItemCatalog, ItemInfo, StaticCatalog};
pub use cfg::GroundingConfig;
pub use error::{GenerationError, GroundingError, RetrievalError};
pub use garbage::{OutputClassifier, TemplateLeakClassifier};
pub use llm::{BackendName, GenerationBackend, ProfileBackend};
pub use orchestrator::{REFUSAL_TEXT, TurnOrchestrator};
pub use retrieve::{EvidenceRetriever, StoreRetriever};
