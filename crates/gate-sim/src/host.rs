//! Simulated Mini App host.
//!
//! Stands in for the Telegram client: a scripted biometry bridge, console
//! haptics and popups, and a JSON file playing the role of cloud storage.

use app_settings::{CloudStorage, FileStore, LocalStore, StorageResult};
use async_trait::async_trait;
use biometric_gate::{
    AuthenticateResponse, BiometryAuthStatus, BiometryType, CapabilityProvider, CapabilityState,
    HapticEngine, HapticKind, HostError, HostResult, ImpactStyle, PopupHost, PopupParams,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// How the simulated sensor answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBehavior {
    Authorized,
    Failed,
    Error,
}

/// What the simulated host reports.
#[derive(Debug, Clone)]
pub struct HostScript {
    /// Biometry bridge present and able to authenticate
    pub available: bool,
    /// Access was granted in an earlier session
    pub access_granted: bool,
    /// Answer to the access prompt
    pub grant_access: bool,
    pub auth: AuthBehavior,
    /// Simulated time the user takes to answer a prompt
    pub prompt_delay: Duration,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            available: true,
            access_granted: true,
            grant_access: true,
            auth: AuthBehavior::Authorized,
            prompt_delay: Duration::from_millis(150),
        }
    }
}

/// Biometry bridge following a [`HostScript`].
///
/// Starts unmounted, like the real bridge before the app boots.
pub struct SimulatedBiometry {
    script: HostScript,
    device_id: String,
    mounted: AtomicBool,
    access_granted: AtomicBool,
}

impl SimulatedBiometry {
    pub fn new(script: HostScript) -> Self {
        let access_granted = script.access_granted;
        Self {
            script,
            device_id: Uuid::new_v4().to_string(),
            mounted: AtomicBool::new(false),
            access_granted: AtomicBool::new(access_granted),
        }
    }
}

#[async_trait]
impl CapabilityProvider for SimulatedBiometry {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn authenticate_available(&self) -> bool {
        self.script.available && self.is_mounted()
    }

    fn state(&self) -> HostResult<CapabilityState> {
        if !self.is_mounted() {
            return Err(HostError::NotMounted);
        }
        let access_granted = self.access_granted.load(Ordering::SeqCst);
        Ok(CapabilityState {
            mounted: true,
            available: self.script.available,
            access_granted,
            access_requested: access_granted || self.script.access_granted,
            biometry_type: self.script.available.then_some(BiometryType::Finger),
            device_id: Some(self.device_id.clone()),
            token_saved: false,
        })
    }

    fn request_access_available(&self) -> bool {
        self.is_mounted()
    }

    async fn request_access(&self, reason: &str) -> HostResult<bool> {
        info!(reason, "Host: access prompt shown");
        tokio::time::sleep(self.script.prompt_delay).await;

        let granted = self.script.grant_access;
        self.access_granted.store(granted, Ordering::SeqCst);
        info!(granted, "Host: access prompt answered");
        Ok(granted)
    }

    fn mount_available(&self) -> bool {
        self.script.available
    }

    async fn mount(&self) -> HostResult<()> {
        if !self.script.available {
            return Err(HostError::Unsupported("biometry.mount".to_string()));
        }
        self.mounted.store(true, Ordering::SeqCst);
        debug!("Host: biometry mounted");
        Ok(())
    }

    async fn authenticate(&self, reason: &str) -> HostResult<AuthenticateResponse> {
        info!(reason, "Host: biometric prompt shown");
        tokio::time::sleep(self.script.prompt_delay).await;

        match self.script.auth {
            AuthBehavior::Authorized => Ok(AuthenticateResponse {
                status: BiometryAuthStatus::Authorized,
                token: Some(Uuid::new_v4().to_string()),
            }),
            AuthBehavior::Failed => Ok(AuthenticateResponse::failed()),
            AuthBehavior::Error => Err(HostError::Failed("Biometric sensor unavailable".to_string())),
        }
    }

    fn open_settings_available(&self) -> bool {
        self.is_mounted()
    }

    fn open_settings(&self) -> HostResult<()> {
        info!("Host: biometry settings opened");
        Ok(())
    }
}

/// Haptic engine that writes each pulse to stderr.
pub struct ConsoleHaptics;

impl HapticEngine for ConsoleHaptics {
    fn impact_available(&self) -> bool {
        true
    }

    fn impact_occurred(&self, style: ImpactStyle) -> HostResult<()> {
        eprintln!("[haptic] impact {style:?}");
        Ok(())
    }

    fn notification_available(&self) -> bool {
        true
    }

    fn notification_occurred(&self, kind: HapticKind) -> HostResult<()> {
        eprintln!("[haptic] notification {kind:?}");
        Ok(())
    }

    fn selection_available(&self) -> bool {
        true
    }

    fn selection_changed(&self) -> HostResult<()> {
        eprintln!("[haptic] selection");
        Ok(())
    }
}

/// Popups rendered as stderr lines.
pub struct ConsolePopup;

impl PopupHost for ConsolePopup {
    fn is_supported(&self) -> bool {
        true
    }

    fn show(&self, params: PopupParams) -> HostResult<()> {
        eprintln!("[popup] {}: {}", params.title, params.message);
        Ok(())
    }
}

/// Cloud storage kept in a JSON file next to the local store.
pub struct FileCloud {
    store: FileStore,
}

impl FileCloud {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: FileStore::new(path),
        }
    }
}

#[async_trait]
impl CloudStorage for FileCloud {
    fn is_supported(&self) -> bool {
        true
    }

    async fn get_item(&self, key: &str) -> StorageResult<String> {
        Ok(self.store.get(key)?.unwrap_or_default())
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.store.set(key, value)
    }

    async fn delete_item(&self, key: &str) -> StorageResult<()> {
        self.store.delete(key).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn instant(script: HostScript) -> SimulatedBiometry {
        SimulatedBiometry::new(HostScript {
            prompt_delay: Duration::ZERO,
            ..script
        })
    }

    #[tokio::test]
    async fn test_starts_unmounted() {
        let host = instant(HostScript::default());

        assert!(!host.is_mounted());
        assert!(!host.authenticate_available());
        assert_eq!(host.state(), Err(HostError::NotMounted));

        host.mount().await.unwrap();
        let state = host.state().unwrap();
        assert!(state.mounted);
        assert!(state.access_granted);
        assert_eq!(state.biometry_type, Some(BiometryType::Finger));
        assert!(host.authenticate_available());
    }

    #[tokio::test]
    async fn test_unavailable_host_cannot_mount() {
        let host = instant(HostScript {
            available: false,
            ..HostScript::default()
        });

        assert!(!host.mount_available());
        assert!(host.mount().await.is_err());
        assert!(!host.is_mounted());
    }

    #[tokio::test]
    async fn test_access_prompt_updates_state() {
        let host = instant(HostScript {
            access_granted: false,
            grant_access: true,
            ..HostScript::default()
        });
        host.mount().await.unwrap();
        assert!(!host.state().unwrap().access_granted);

        assert!(host.request_access("why").await.unwrap());
        assert!(host.state().unwrap().access_granted);
    }

    #[tokio::test]
    async fn test_auth_behaviors() {
        let authorized = instant(HostScript::default());
        let response = authorized.authenticate("r").await.unwrap();
        assert!(response.is_authorized());
        assert!(response.token.is_some());

        let failed = instant(HostScript {
            auth: AuthBehavior::Failed,
            ..HostScript::default()
        });
        assert!(!failed.authenticate("r").await.unwrap().is_authorized());

        let error = instant(HostScript {
            auth: AuthBehavior::Error,
            ..HostScript::default()
        });
        assert!(error.authenticate("r").await.is_err());
    }

    #[tokio::test]
    async fn test_file_cloud_returns_empty_for_missing_keys() {
        let dir = tempdir().unwrap();
        let cloud = FileCloud::new(dir.path().join("cloud.json"));

        assert_eq!(cloud.get_item("app-settings").await.unwrap(), "");

        cloud.set_item("app-settings", "{}").await.unwrap();
        assert_eq!(cloud.get_item("app-settings").await.unwrap(), "{}");

        cloud.delete_item("app-settings").await.unwrap();
        assert_eq!(cloud.get_item("app-settings").await.unwrap(), "");
    }
}
