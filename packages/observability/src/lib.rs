//! # Observability
//!
//! Logging setup shared by the Folio client crates.
//!
//! Library crates only emit events through the `tracing` macros. The binary
//! calls [`init`] or [`init_with_config`] once at startup, which installs:
//!
//! - a JSONL file layer (`~/.folio/logs/client.jsonl` by default), one
//!   structured entry per event, with credential-looking fields redacted
//! - an optional compact stderr layer for interactive use
//!
//! `RUST_LOG` takes precedence over the configured default level.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "folio-cli".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("ready");
//! ```

mod file_sink;
mod json_layer;

use std::path::PathBuf;

pub use json_layer::{redact_fields, LogEntry, REDACTED};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the emitting program, written into every entry.
    pub service_name: String,

    /// Default filter directive (e.g. "info", "folio_session=debug").
    pub default_level: String,

    /// Custom JSONL file path. Defaults to `~/.folio/logs/client.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact human-readable lines to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with a custom configuration.
///
/// If the log file cannot be opened, only the stderr layer is installed and a
/// warning is emitted through it.
pub fn init_with_config(config: LogConfig) {
    file_sink::init_subscriber(&config);
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
