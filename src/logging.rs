//! Logging bootstrap over `tracing` + `tracing-subscriber`.
//!
//! Level resolution: explicit argument, then the `GANTT_ENGINE_LOG`
//! environment variable, then `info`.

use tracing::Level;
use tracing_subscriber::fmt;

const LEVEL_ENV_VAR: &str = "GANTT_ENGINE_LOG";

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging(level: Option<Level>) {
    let level = level
        .or_else(|| std::env::var(LEVEL_ENV_VAR).ok().and_then(|s| parse_level(&s)))
        .unwrap_or(Level::INFO);

    let _ = fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}

fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
