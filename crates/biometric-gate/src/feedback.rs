//! Host haptics and popups.
//!
//! [`Haptics`] is the settings-aware wrapper UI code uses directly.
//! [`HostNotifier`] is the production [`Notifier`] handed to the coordinator,
//! which does its own settings gating.

use crate::{HapticKind, HostError, HostResult, Notifier};
use app_settings::SettingsSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Impact haptic strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    #[default]
    Medium,
    Heavy,
    Rigid,
    Soft,
}

/// Host haptic engine. Each call has a matching availability probe.
pub trait HapticEngine: Send + Sync {
    fn impact_available(&self) -> bool;
    fn impact_occurred(&self, style: ImpactStyle) -> HostResult<()>;

    fn notification_available(&self) -> bool;
    fn notification_occurred(&self, kind: HapticKind) -> HostResult<()>;

    fn selection_available(&self) -> bool;
    fn selection_changed(&self) -> HostResult<()>;
}

/// Settings-aware haptics for UI code.
///
/// Every call is a silent no-op when haptics are disabled in settings or
/// the host lacks the call.
#[derive(Clone)]
pub struct Haptics {
    engine: Arc<dyn HapticEngine>,
    settings: Arc<dyn SettingsSource>,
}

impl Haptics {
    pub fn new(engine: Arc<dyn HapticEngine>, settings: Arc<dyn SettingsSource>) -> Self {
        Self { engine, settings }
    }

    fn enabled(&self) -> bool {
        self.settings.current().haptics_enabled
    }

    pub fn impact(&self, style: ImpactStyle) {
        if self.enabled() && self.engine.impact_available() {
            log_failure("impact", self.engine.impact_occurred(style));
        }
    }

    pub fn notification(&self, kind: HapticKind) {
        if self.enabled() && self.engine.notification_available() {
            log_failure("notification", self.engine.notification_occurred(kind));
        }
    }

    pub fn selection(&self) {
        if self.enabled() && self.engine.selection_available() {
            log_failure("selection", self.engine.selection_changed());
        }
    }
}

fn log_failure(call: &'static str, result: HostResult<()>) {
    if let Err(e) = result {
        debug!(call, error = %e, "Haptic call failed");
    }
}

/// Popup button type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PopupButton {
    Ok,
    Close,
    Cancel,
    Default { id: String, text: String },
    Destructive { id: String, text: String },
}

/// Native popup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupParams {
    pub title: String,
    pub message: String,
    pub buttons: Vec<PopupButton>,
}

/// Host native popups.
pub trait PopupHost: Send + Sync {
    fn is_supported(&self) -> bool;

    fn show(&self, params: PopupParams) -> HostResult<()>;
}

/// [`Notifier`] backed by the host haptic engine and popups.
pub struct HostNotifier {
    engine: Arc<dyn HapticEngine>,
    popup: Arc<dyn PopupHost>,
}

impl HostNotifier {
    pub fn new(engine: Arc<dyn HapticEngine>, popup: Arc<dyn PopupHost>) -> Self {
        Self { engine, popup }
    }
}

impl Notifier for HostNotifier {
    fn haptic_pulse(&self, kind: HapticKind) -> HostResult<()> {
        if !self.engine.notification_available() {
            return Err(HostError::Unsupported(
                "hapticFeedback.notificationOccurred".to_string(),
            ));
        }
        self.engine.notification_occurred(kind)
    }

    fn show_error_modal(&self, title: &str, message: &str) -> HostResult<()> {
        if !self.popup.is_supported() {
            return Err(HostError::Unsupported("popup".to_string()));
        }
        self.popup.show(PopupParams {
            title: title.to_string(),
            message: message.to_string(),
            buttons: vec![PopupButton::Ok],
        })
    }
}
