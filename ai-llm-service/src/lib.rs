//! Shared LLM access layer: provider configs, Gemini/Ollama clients,
//! health checks and the tracing layer used by the whole workspace.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;
