//! Configuration management for the biometric gate.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Delay before an `authorized` status falls back to `idle`.
pub const DEFAULT_RESET_DELAY_MS: u64 = 1000;

/// Reason shown when the best-effort flow has to ask for the access grant.
pub const DEFAULT_WITH_AUTH_ACCESS_REASON: &str = "Secure your actions with biometrics";

/// Reason shown when the strict flow has to ask for the access grant.
pub const DEFAULT_REQUIRE_AUTH_ACCESS_REASON: &str = "This action requires biometrics";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write JSONL logs to `~/.tma-gate/logs` instead of stderr only.
    #[serde(default)]
    pub log_to_file: bool,
    /// Milliseconds before `authorized` resets to `idle`.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    /// Access-grant prompt used by the best-effort flow.
    #[serde(default = "default_with_auth_access_reason")]
    pub with_auth_access_reason: String,
    /// Access-grant prompt used by the strict flow.
    #[serde(default = "default_require_auth_access_reason")]
    pub require_auth_access_reason: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_reset_delay_ms() -> u64 {
    DEFAULT_RESET_DELAY_MS
}

fn default_with_auth_access_reason() -> String {
    DEFAULT_WITH_AUTH_ACCESS_REASON.to_string()
}

fn default_require_auth_access_reason() -> String {
    DEFAULT_REQUIRE_AUTH_ACCESS_REASON.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_to_file: false,
            reset_delay_ms: DEFAULT_RESET_DELAY_MS,
            with_auth_access_reason: default_with_auth_access_reason(),
            require_auth_access_reason: default_require_auth_access_reason(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables win over the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// The authorized→idle reset delay.
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.with_auth_access_reason.trim().is_empty()
            || self.require_auth_access_reason.trim().is_empty()
        {
            return Err(CoreError::Config(
                "access reasons must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("TMA_GATE_LOG_LEVEL") {
            if !log_level.trim().is_empty() {
                self.log_level = log_level;
            }
        }
        if let Some(delay) = std::env::var("TMA_GATE_RESET_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.reset_delay_ms = delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.log_to_file);
        assert_eq!(config.reset_delay(), Duration::from_millis(1000));
        assert_eq!(
            config.with_auth_access_reason,
            "Secure your actions with biometrics"
        );
        assert_eq!(
            config.require_auth_access_reason,
            "This action requires biometrics"
        );
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(&config_path, r#"{ "log_level": "debug", "reset_delay_ms": 250 }"#)
            .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.reset_delay_ms, 250);
        assert_eq!(
            config.with_auth_access_reason,
            DEFAULT_WITH_AUTH_ACCESS_REASON
        );
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            log_to_file: true,
            require_auth_access_reason: "Confirm transfer".to_string(),
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert!(loaded.log_to_file);
        assert_eq!(loaded.require_auth_access_reason, "Confirm transfer");
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.reset_delay_ms, DEFAULT_RESET_DELAY_MS);
    }

    #[test]
    fn test_config_rejects_blank_reason() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        paths.ensure_dirs().unwrap();
        std::fs::write(paths.config_file(), r#"{ "with_auth_access_reason": "  " }"#).unwrap();

        let result = Config::load(&paths);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_config_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(CoreError::Json(_))
        ));
    }
}
