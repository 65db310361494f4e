//! Logging initialization.
//!
//! Wraps the observability package so the binary has a single call to make.
//! Events are written as JSONL to `~/.folio/logs/client.jsonl`; stderr output
//! is enabled when the level is `debug` or more verbose so interactive runs
//! can see request traces.

use crate::Paths;

/// Initialize logging for the `folio` command-line client.
///
/// `level` is the default filter directive; `RUST_LOG` overrides it.
pub fn init_logging(level: &str, paths: Option<&Paths>) {
    let verbose = parse_level(level) >= tracing::Level::DEBUG;

    observability::init_with_config(observability::LogConfig {
        service_name: "folio-cli".into(),
        default_level: level.into(),
        log_path: paths.map(Paths::log_file),
        also_stderr: verbose,
    });
}

/// Parse a log level string into a tracing Level. Unknown values map to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
