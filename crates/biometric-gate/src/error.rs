//! Gate error types.

use crate::AuthStatus;
use thiserror::Error;

/// Failure reported by a host adapter call.
///
/// Host calls never panic or throw; they hand one of these back and the
/// caller decides whether it matters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host rejected or failed the call
    #[error("{0}")]
    Failed(String),

    /// The host does not offer this capability
    #[error("Capability not supported: {0}")]
    Unsupported(String),

    /// The biometry bridge has not been mounted
    #[error("Biometry is not mounted")]
    NotMounted,
}

/// Result type alias for host adapter calls.
pub type HostResult<T> = Result<T, HostError>;

/// Why a gated flow did not complete normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Biometric hardware or host support is missing
    #[error("Biometry not available on this device")]
    Unavailable,

    /// The user declined the one-time access grant
    #[error("Biometry access denied")]
    AccessDenied,

    /// The authenticate call came back without authorization
    #[error("{0}")]
    AuthDenied(String),

    /// A provider call failed unexpectedly
    #[error("{0}")]
    Provider(#[from] HostError),

    /// The wrapped unit of work failed
    #[error("{0}")]
    Work(String),

    /// The status machine rejected a transition
    #[error("Invalid status transition: {0}")]
    InvalidStateTransition(String),
}

impl GateError {
    /// Status a flow ends in when it fails with this error.
    pub fn status(&self) -> AuthStatus {
        match self {
            GateError::Unavailable => AuthStatus::Unavailable,
            GateError::AccessDenied | GateError::AuthDenied(_) => AuthStatus::Denied,
            GateError::Provider(_) | GateError::Work(_) | GateError::InvalidStateTransition(_) => {
                AuthStatus::Error
            }
        }
    }
}

/// Result type alias using GateError.
pub type GateResult<T> = Result<T, GateError>;
