//! File system paths.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".tma-gate";

/// Manages file system paths.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.tma-gate)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.tma-gate`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.tma-gate).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.tma-gate/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the local key/value store path (~/.tma-gate/local-storage.json).
    pub fn local_storage_file(&self) -> PathBuf {
        self.base_dir.join("local-storage.json")
    }

    /// Get the simulated cloud store path (~/.tma-gate/cloud-storage.json).
    pub fn cloud_storage_file(&self) -> PathBuf {
        self.base_dir.join("cloud-storage.json")
    }

    /// Get the logs directory (~/.tma-gate/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.tma-gate/logs/gate.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("gate.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/gate"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/gate/config.json"));
        assert_eq!(
            paths.local_storage_file(),
            PathBuf::from("/tmp/gate/local-storage.json")
        );
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/gate/logs/gate.jsonl"));
    }

    #[test]
    fn test_ensure_dirs_creates_logs_dir() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.logs_dir().is_dir());
    }
}
