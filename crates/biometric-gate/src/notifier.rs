//! User feedback consumed by the coordinator.

use crate::HostResult;
use serde::{Deserialize, Serialize};

/// Title used for every error modal raised by a biometric flow.
pub const ERROR_MODAL_TITLE: &str = "Authentication Error";

/// Notification haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticKind {
    Success,
    Error,
    Warning,
}

/// Haptic and modal feedback. Both calls are best-effort.
pub trait Notifier: Send + Sync {
    fn haptic_pulse(&self, kind: HapticKind) -> HostResult<()>;

    fn show_error_modal(&self, title: &str, message: &str) -> HostResult<()>;
}
