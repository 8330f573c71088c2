//! Storage trait definitions.

use crate::StorageResult;
use async_trait::async_trait;

/// Synchronous local key/value store (the `localStorage` role).
pub trait LocalStore: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Host-provided cloud key/value storage.
///
/// Missing keys come back as an empty string, matching the host.
#[async_trait]
pub trait CloudStorage: Send + Sync {
    /// Whether the host exposes cloud storage at all.
    fn is_supported(&self) -> bool;

    fn get_item_available(&self) -> bool {
        true
    }

    fn set_item_available(&self) -> bool {
        true
    }

    fn delete_item_available(&self) -> bool {
        true
    }

    async fn get_item(&self, key: &str) -> StorageResult<String>;

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    async fn delete_item(&self, key: &str) -> StorageResult<()>;
}

/// Async string-to-string storage consumed by the settings store.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn get_item(&self, name: &str) -> StorageResult<Option<String>>;

    async fn set_item(&self, name: &str, value: &str) -> StorageResult<()>;

    async fn remove_item(&self, name: &str) -> StorageResult<()>;
}
