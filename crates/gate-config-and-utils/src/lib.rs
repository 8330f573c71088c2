//! Configuration, paths and logging setup shared by the gate crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_LOG_LEVEL, DEFAULT_REQUIRE_AUTH_ACCESS_REASON, DEFAULT_RESET_DELAY_MS,
    DEFAULT_WITH_AUTH_ACCESS_REASON,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
