//! Settings persistence for the biometric gate.
//!
//! This crate provides:
//! - **Local stores**: in-memory and JSON-file key/value stores
//! - **Cloud sync**: a local-first adapter mirroring writes to host cloud storage
//! - **Settings**: the persisted `hapticsEnabled` / `biometryEnabled` flags

mod cloud_sync;
mod local;
mod settings;
mod traits;

pub use cloud_sync::CloudSyncStorage;
pub use local::{FileStore, MemoryStore};
pub use settings::{AppSettings, SettingsSource, SettingsStore, SETTINGS_STORAGE_KEY};
pub use traits::{CloudStorage, LocalStore, StateStorage};

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Host storage call failed
    #[error("Host storage error: {0}")]
    Host(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
