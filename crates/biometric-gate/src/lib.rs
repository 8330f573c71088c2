//! Biometric gate for Telegram Mini App hosts.
//!
//! This crate provides:
//! - A coordinator wrapping units of work with a biometric check
//! - An explicit FSM for the status shown to the UI
//! - Host capability traits (biometry, haptics, popups) and their adapters

mod coordinator;
mod error;
mod feedback;
mod flow;
mod notifier;
mod outcome;
mod provider;
mod status_fsm;

#[cfg(test)]
mod tests;

pub use coordinator::{BiometricAuthCoordinator, GateConfig};
pub use error::{GateError, GateResult, HostError, HostResult};
pub use feedback::{HapticEngine, Haptics, HostNotifier, ImpactStyle, PopupButton, PopupHost, PopupParams};
pub use flow::StatusSnapshot;
pub use notifier::{HapticKind, Notifier, ERROR_MODAL_TITLE};
pub use outcome::AuthOutcome;
pub use provider::{
    AuthenticateResponse, BiometryAuthStatus, BiometryType, CapabilityProvider, CapabilityState,
};
pub use status_fsm::status_machine;
pub use status_fsm::{AuthStatus, StatusInput, StatusMachine, StatusMachineState};
