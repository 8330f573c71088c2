//! Logging initialization.
//!
//! Thin wrapper over the observability crate so binaries configure tracing
//! the same way.

use crate::{Config, Paths};

#[allow(unused_imports)]
pub use observability::{init, init_with_config, LogConfig, LogOutput};

/// Initialize logging for `service_name` from a loaded [`Config`].
///
/// `RUST_LOG` still overrides `config.log_level`.
///
/// ```ignore
/// init_logging("gate-sim", &config, &paths);
/// tracing::info!("started");
/// ```
pub fn init_logging(service_name: &str, config: &Config, paths: &Paths) {
    let output = if config.log_to_file {
        LogOutput::JsonFile
    } else {
        LogOutput::Stderr
    };

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: config.log_level.clone(),
        output,
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });
}
