// Logging setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter directives from config; `RUST_LOG` wins over these when set
pub fn directives(config: &LoggingConfig) -> String {
    let level = config
        .level
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("info");

    match config.filters.as_deref().map(str::trim) {
        Some(filters) if !filters.is_empty() => format!("{},{}", level, filters),
        _ => level.to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(config)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
