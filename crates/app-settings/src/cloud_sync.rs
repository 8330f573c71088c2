//! Local-first storage that mirrors writes to host cloud storage.
//!
//! The local store is authoritative for writes and always succeeds first.
//! Reads prefer a non-empty cloud value, which is copied back to the local
//! store. An unreadable local value counts as absent. Cloud failures never
//! surface to callers.

use crate::{CloudStorage, LocalStore, StateStorage, StorageResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// [`StateStorage`] over a local store plus optional cloud storage.
pub struct CloudSyncStorage {
    local: Arc<dyn LocalStore>,
    cloud: Option<Arc<dyn CloudStorage>>,
}

impl CloudSyncStorage {
    pub fn new(local: Arc<dyn LocalStore>, cloud: Arc<dyn CloudStorage>) -> Self {
        Self {
            local,
            cloud: Some(cloud),
        }
    }

    /// Storage without a cloud mirror.
    pub fn local_only(local: Arc<dyn LocalStore>) -> Self {
        Self { local, cloud: None }
    }

    fn cloud_if(&self, available: impl Fn(&dyn CloudStorage) -> bool) -> Option<&dyn CloudStorage> {
        self.cloud
            .as_deref()
            .filter(|cloud| cloud.is_supported() && available(*cloud))
    }
}

#[async_trait]
impl StateStorage for CloudSyncStorage {
    async fn get_item(&self, name: &str) -> StorageResult<Option<String>> {
        let local_value = match self.local.get(name) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = name, error = %e, "Local read failed, treating value as absent");
                None
            }
        };

        if let Some(cloud) = self.cloud_if(|c| c.get_item_available()) {
            match cloud.get_item(name).await {
                Ok(cloud_value) if !cloud_value.is_empty() => {
                    if let Err(e) = self.local.set(name, &cloud_value) {
                        warn!(key = name, error = %e, "Failed to mirror cloud value locally");
                    }
                    return Ok(Some(cloud_value));
                }
                Ok(_) => debug!(key = name, "Cloud storage has no value"),
                Err(e) => debug!(key = name, error = %e, "Cloud read failed, using local value"),
            }
        }

        Ok(local_value)
    }

    async fn set_item(&self, name: &str, value: &str) -> StorageResult<()> {
        self.local.set(name, value)?;

        if let Some(cloud) = self.cloud_if(|c| c.set_item_available()) {
            if let Err(e) = cloud.set_item(name, value).await {
                debug!(key = name, error = %e, "Cloud write failed, local value kept");
            }
        }

        Ok(())
    }

    async fn remove_item(&self, name: &str) -> StorageResult<()> {
        self.local.delete(name)?;

        if let Some(cloud) = self.cloud_if(|c| c.delete_item_available()) {
            if let Err(e) = cloud.delete_item(name).await {
                debug!(key = name, error = %e, "Cloud delete failed");
            }
        }

        Ok(())
    }
}
