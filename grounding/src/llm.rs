//! Generation backend seam.
//!
//! Backends are selected by [`BackendName`]. Only `primary` exists; there is
//! no fallback to another backend when it is unavailable.

use std::{fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use serde::Serialize;

use crate::error::{GenerationError, GroundingError};

/// Closed set of backend names a caller may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendName {
    Primary,
}

impl BackendName {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendName::Primary => "primary",
        }
    }
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendName {
    type Err = GroundingError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(BackendName::Primary),
            other => Err(GroundingError::InvalidBackend(other.to_string())),
        }
    }
}

/// Text-in, text-out generation.
pub trait GenerationBackend: Send + Sync {
    /// `false` when the backend cannot serve at all (e.g. no API key).
    fn is_available(&self) -> bool;

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

/// [`GenerationBackend`] over the primary profile of [`LlmServiceProfiles`].
pub struct ProfileBackend {
    svc: Arc<LlmServiceProfiles>,
}

impl ProfileBackend {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl GenerationBackend for ProfileBackend {
    fn is_available(&self) -> bool {
        self.svc.is_primary_configured()
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(async move {
            self.svc.generate_primary(prompt).await.map_err(|e| {
                if e.is_unauthorized() {
                    GenerationError::Unavailable(e.to_string())
                } else {
                    GenerationError::Failed(e.to_string())
                }
            })
        })
    }
}
