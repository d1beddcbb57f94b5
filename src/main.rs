use std::error::Error;

use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file; a missing file is fine.
    let dotenv = dotenvy::dotenv();

    // LOG_LEVEL applies to the workspace crates; RUST_LOG covers the rest.
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    tracing_subscriber::registry()
        .with(ai_llm_service::telemetry::env_filter_with_level(
            "info,grounding=info",
            level,
        ))
        .with(ai_llm_service::telemetry::layer())
        .init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env; using process environment"),
    }

    api::start().await?;

    Ok(())
}
