//! Host capability traits consumed by the coordinator.

use crate::HostResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of biometric sensor reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometryType {
    Finger,
    Face,
    #[serde(other)]
    Unknown,
}

/// Biometry state as reported by the host. Never cached by the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityState {
    pub mounted: bool,
    pub available: bool,
    pub access_granted: bool,
    pub access_requested: bool,
    #[serde(rename = "type")]
    pub biometry_type: Option<BiometryType>,
    pub device_id: Option<String>,
    pub token_saved: bool,
}

/// Status string returned by the authenticate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometryAuthStatus {
    Authorized,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Result of a single authenticate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub status: BiometryAuthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthenticateResponse {
    pub fn authorized() -> Self {
        Self {
            status: BiometryAuthStatus::Authorized,
            token: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            status: BiometryAuthStatus::Failed,
            token: None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.status == BiometryAuthStatus::Authorized
    }
}

/// Biometric bridge to the host application.
///
/// Availability probes are cheap and synchronous; anything that talks to
/// the user or the sensor is async.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn is_mounted(&self) -> bool;

    fn authenticate_available(&self) -> bool;

    /// Current host state. May fail while the bridge is (re)mounting.
    fn state(&self) -> HostResult<CapabilityState>;

    fn request_access_available(&self) -> bool;

    /// Ask the user for the one-time access grant.
    async fn request_access(&self, reason: &str) -> HostResult<bool>;

    fn mount_available(&self) -> bool;

    async fn mount(&self) -> HostResult<()>;

    /// Prompt the biometric sensor.
    async fn authenticate(&self, reason: &str) -> HostResult<AuthenticateResponse>;

    fn open_settings_available(&self) -> bool;

    /// Open the host's biometry settings. Only call in direct response to a
    /// user gesture; hosts ignore it otherwise.
    fn open_settings(&self) -> HostResult<()>;
}
