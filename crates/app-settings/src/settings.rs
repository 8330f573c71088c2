//! Persisted user settings.

use crate::{StateStorage, StorageResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key the settings are persisted under.
pub const SETTINGS_STORAGE_KEY: &str = "app-settings";

/// Version written into the persisted envelope.
const SETTINGS_VERSION: u32 = 0;

/// User-controlled feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "enabled")]
    pub haptics_enabled: bool,
    #[serde(default = "enabled")]
    pub biometry_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            haptics_enabled: true,
            biometry_enabled: true,
        }
    }
}

/// Read-only view of the current settings.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> AppSettings;
}

impl SettingsSource for AppSettings {
    fn current(&self) -> AppSettings {
        *self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSettings {
    state: AppSettings,
    #[serde(default)]
    version: u32,
}

/// In-memory settings persisted through a [`StateStorage`].
///
/// Reads are served from memory. Setters update memory first, then persist;
/// a failed write leaves the new value in memory and returns the error.
pub struct SettingsStore {
    storage: Arc<dyn StateStorage>,
    state: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Create a store holding defaults. Call [`hydrate`](Self::hydrate) to load.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(AppSettings::default()),
        }
    }

    /// Load persisted settings, keeping defaults when nothing usable is stored.
    pub async fn hydrate(&self) -> StorageResult<AppSettings> {
        let loaded = match self.storage.get_item(SETTINGS_STORAGE_KEY).await? {
            Some(raw) => match serde_json::from_str::<PersistedSettings>(&raw) {
                Ok(persisted) => {
                    if persisted.version != SETTINGS_VERSION {
                        debug!(
                            version = persisted.version,
                            "Persisted settings version differs, reading as-is"
                        );
                    }
                    persisted.state
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted settings");
                    AppSettings::default()
                }
            },
            None => AppSettings::default(),
        };

        *self.state.write() = loaded;
        debug!(
            haptics_enabled = loaded.haptics_enabled,
            biometry_enabled = loaded.biometry_enabled,
            "Settings hydrated"
        );
        Ok(loaded)
    }

    pub fn get(&self) -> AppSettings {
        *self.state.read()
    }

    pub async fn set_haptics_enabled(&self, enabled: bool) -> StorageResult<()> {
        self.update(|s| s.haptics_enabled = enabled).await
    }

    pub async fn set_biometry_enabled(&self, enabled: bool) -> StorageResult<()> {
        self.update(|s| s.biometry_enabled = enabled).await
    }

    async fn update(&self, apply: impl FnOnce(&mut AppSettings)) -> StorageResult<()> {
        let snapshot = {
            let mut state = self.state.write();
            apply(&mut *state);
            *state
        };

        let payload = serde_json::to_string(&PersistedSettings {
            state: snapshot,
            version: SETTINGS_VERSION,
        })?;
        self.storage.set_item(SETTINGS_STORAGE_KEY, &payload).await
    }
}

impl SettingsSource for SettingsStore {
    fn current(&self) -> AppSettings {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud_sync::tests::FakeCloud;
    use crate::{CloudSyncStorage, FileStore, LocalStore, MemoryStore};

    fn memory_store() -> (Arc<MemoryStore>, SettingsStore) {
        let local = Arc::new(MemoryStore::new());
        let store = SettingsStore::new(Arc::new(CloudSyncStorage::local_only(local.clone())));
        (local, store)
    }

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let (_local, store) = memory_store();

        let settings = store.hydrate().await.unwrap();
        assert!(settings.haptics_enabled);
        assert!(settings.biometry_enabled);
    }

    #[tokio::test]
    async fn test_setter_persists_envelope() {
        let (local, store) = memory_store();

        store.set_biometry_enabled(false).await.unwrap();
        assert!(!store.get().biometry_enabled);

        let raw = local.get(SETTINGS_STORAGE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["state"]["biometryEnabled"], false);
        assert_eq!(json["state"]["hapticsEnabled"], true);
        assert_eq!(json["version"], 0);
    }

    #[tokio::test]
    async fn test_hydrate_reads_persisted_values() {
        let (local, store) = memory_store();
        local
            .set(
                SETTINGS_STORAGE_KEY,
                r#"{"state":{"hapticsEnabled":false,"biometryEnabled":true},"version":0}"#,
            )
            .unwrap();

        let settings = store.hydrate().await.unwrap();
        assert!(!settings.haptics_enabled);
        assert!(settings.biometry_enabled);
        assert_eq!(store.current(), settings);
    }

    #[tokio::test]
    async fn test_hydrate_ignores_corrupt_payload() {
        let (local, store) = memory_store();
        local.set(SETTINGS_STORAGE_KEY, "{not json").unwrap();

        let settings = store.hydrate().await.unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[tokio::test]
    async fn test_hydrate_prefers_cloud_copy() {
        let local = Arc::new(MemoryStore::new());
        let cloud = Arc::new(FakeCloud::new());
        cloud.put(
            SETTINGS_STORAGE_KEY,
            r#"{"state":{"hapticsEnabled":true,"biometryEnabled":false},"version":0}"#,
        );
        let store = SettingsStore::new(Arc::new(CloudSyncStorage::new(local.clone(), cloud)));

        let settings = store.hydrate().await.unwrap();
        assert!(!settings.biometry_enabled);
        assert!(local.has(SETTINGS_STORAGE_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_hydrate_recovers_from_corrupt_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let local = Arc::new(FileStore::new(&path));
        let cloud = Arc::new(FakeCloud::new());
        cloud.put(
            SETTINGS_STORAGE_KEY,
            r#"{"state":{"hapticsEnabled":true,"biometryEnabled":false},"version":0}"#,
        );
        let store = SettingsStore::new(Arc::new(CloudSyncStorage::new(local.clone(), cloud)));

        let settings = store.hydrate().await.unwrap();
        assert!(settings.haptics_enabled);
        assert!(!settings.biometry_enabled);
        assert!(local.has(SETTINGS_STORAGE_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_hydrate_defaults_when_local_corrupt_and_cloud_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let cloud = Arc::new(FakeCloud::new());
        cloud.failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let store = SettingsStore::new(Arc::new(CloudSyncStorage::new(
            Arc::new(FileStore::new(&path)),
            cloud,
        )));

        let settings = store.hydrate().await.unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_fixed_settings_source() {
        let fixed = AppSettings {
            haptics_enabled: false,
            biometry_enabled: true,
        };
        assert_eq!(fixed.current(), fixed);
    }
}
