//! Workspace-scoped tracing layer.
//!
//! The binary composes [`layer`] with its global subscriber; the layer only
//! renders events emitted by the workspace crates listed in [`TARGET_PREFIXES`].

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Targets rendered by [`layer`].
pub const TARGET_PREFIXES: &[&str] = &["ai_llm_service", "rag_store", "grounding", "api"];

/// RFC3339 UTC timer via `chrono`, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| {
        target == *p
            || target
                .strip_prefix(p)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Compact single-line layer with `file:line`, span close timings and ANSI
/// colors only on a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

/// Per-crate directives such as `grounding=debug` for every workspace crate.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    TARGET_PREFIXES
        .iter()
        .filter_map(|p| format!("{p}={lvl}").parse::<Directive>().ok())
        .collect()
}

/// `EnvFilter` from `RUST_LOG`, or `default` when unset, with the workspace
/// crates raised to `level`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    level_directives(level)
        .into_iter()
        .fold(base, |f, d| f.add_directive(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_crate_targets_only() {
        assert!(is_workspace_target("grounding::orchestrator"));
        assert!(is_workspace_target("api"));
        assert!(!is_workspace_target("apiary::x"));
        assert!(!is_workspace_target("hyper::proto"));
    }

    #[test]
    fn one_directive_per_crate() {
        assert_eq!(level_directives(Level::DEBUG).len(), TARGET_PREFIXES.len());
    }
}
