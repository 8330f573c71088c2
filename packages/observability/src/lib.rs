//! # Observability
//!
//! Centralized tracing setup for the biometric gate workspace.
//!
//! Crates are **log producers** only. They use the standard `tracing` macros
//! and never configure subscribers themselves; binaries call
//! [`init`] or [`init_with_config`] once at startup.
//!
//! Two outputs are supported:
//!
//! - a compact, human-readable stderr stream (always available)
//! - an append-only JSONL file (`~/.tma-gate/logs/gate.jsonl` by default)
//!   written by [`JsonLayer`], one structured entry per line
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("gate-sim");
//!     tracing::info!("ready");
//! }
//! ```

mod file_sink;
mod json_layer;

pub use file_sink::{default_log_path, CentralLogWriter};
pub use json_layer::{JsonLayer, LogEntry};

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Compact text on stderr only.
    Stderr,
    /// JSONL file, optionally mirrored to stderr (see [`LogConfig::also_stderr`]).
    JsonFile,
}

impl Default for LogOutput {
    fn default() -> Self {
        Self::Stderr
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "gate-sim").
    /// Included in every JSONL line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Output selection.
    pub output: LogOutput,

    /// Optional custom log file path for [`LogOutput::JsonFile`].
    pub log_path: Option<PathBuf>,

    /// Mirror file output to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            output: LogOutput::Stderr,
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Safe to call more than once; later calls are ignored once a global
/// subscriber is installed.
///
/// ```rust,ignore
/// observability::init_with_config(observability::LogConfig {
///     service_name: "gate-sim".into(),
///     default_level: "debug".into(),
///     output: observability::LogOutput::JsonFile,
///     also_stderr: true,
///     ..Default::default()
/// });
/// ```
pub fn init_with_config(config: LogConfig) {
    let env_filter = build_filter(&config.default_level);

    match config.output {
        LogOutput::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact()
                .try_init();
        }
        LogOutput::JsonFile => {
            let log_path = config.log_path.clone().unwrap_or_else(default_log_path);
            let writer = match CentralLogWriter::new(&log_path) {
                Ok(writer) => writer,
                Err(e) => {
                    // Fall back to stderr rather than running without logs.
                    eprintln!("failed to open log file {:?}: {}", log_path, e);
                    return init_with_config(LogConfig {
                        output: LogOutput::Stderr,
                        ..config
                    });
                }
            };

            let json_layer = JsonLayer::new(config.service_name.clone(), writer);

            let stderr_layer = if config.also_stderr {
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false)
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_filter(build_filter(&config.default_level)),
                )
            } else {
                None
            };

            let installed = tracing_subscriber::registry()
                .with(json_layer.with_filter(env_filter))
                .with(stderr_layer)
                .try_init()
                .is_ok();

            if installed {
                tracing::info!(
                    log_path = %log_path.display(),
                    service = %config.service_name,
                    "observability initialized"
                );
            }
        }
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
