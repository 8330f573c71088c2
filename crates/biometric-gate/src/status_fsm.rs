//! Biometric status state machine using rust-fsm.
//!
//! Every gated invocation drives its own machine from `Idle`; the
//! coordinator publishes each transition to the shared status board.
//!
//! ## State Diagram
//!
//! ```text
//!            ┌──────────┐  RequestAccess   ┌───────────────────┐
//!            │   Idle   │ ───────────────► │ RequestingAccess  │──AccessSettled──► Idle
//!            └────┬─────┘                  └───────┬───────────┘
//!                 │ Check                          │ AccessGranted / AccessRefused
//!                 ▼                                ▼
//!            ┌──────────┐  AccessMissing   (Authenticating / Denied)
//!            │ Checking │ ───────────────► RequestingAccess
//!            └────┬─────┘
//!   NotAvailable  │  AccessPresent
//!   ▼             ▼
//! Unavailable  ┌────────────────┐ AuthSucceeded ┌────────────┐  Reset
//!              │ Authenticating │ ────────────► │ Authorized │ ──────► Idle
//!              └───────┬────────┘               └────────────┘
//!                      │ AuthRejected → Denied
//!                      │ AuthFailed / WorkFailed → Error
//!
//! Unavailable / Denied ── FallbackDone ──► Idle
//!                      └─ WorkFailed ────► Error
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub status_machine(Idle)

    Idle => {
        Check => Checking,
        RequestAccess => RequestingAccess,
        // Biometry disabled in settings and the work itself failed
        WorkFailed => Error
    },
    Checking => {
        NotAvailable => Unavailable,
        AccessMissing => RequestingAccess,
        AccessPresent => Authenticating
    },
    RequestingAccess => {
        AccessGranted => Authenticating,
        AccessRefused => Denied,
        // Standalone access request finished, outside of a gated flow
        AccessSettled => Idle
    },
    Authenticating => {
        AuthSucceeded => Authorized,
        AuthRejected => Denied,
        AuthFailed => Error,
        WorkFailed => Error
    },
    Authorized => {
        Reset => Idle
    },
    Unavailable => {
        FallbackDone => Idle,
        WorkFailed => Error
    },
    Denied => {
        FallbackDone => Idle,
        WorkFailed => Error
    }
}

pub use status_machine::Input as StatusInput;
pub use status_machine::State as StatusMachineState;
pub use status_machine::StateMachine as StatusMachine;

/// Status of a biometric flow, as shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Idle,
    Checking,
    RequestingAccess,
    Authenticating,
    Authorized,
    Denied,
    Unavailable,
    Error,
}

impl AuthStatus {
    /// True while a flow is waiting on the host.
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            AuthStatus::Checking | AuthStatus::RequestingAccess | AuthStatus::Authenticating
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Idle => "idle",
            AuthStatus::Checking => "checking",
            AuthStatus::RequestingAccess => "requesting_access",
            AuthStatus::Authenticating => "authenticating",
            AuthStatus::Authorized => "authorized",
            AuthStatus::Denied => "denied",
            AuthStatus::Unavailable => "unavailable",
            AuthStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&StatusMachineState> for AuthStatus {
    fn from(state: &StatusMachineState) -> Self {
        match state {
            StatusMachineState::Idle => AuthStatus::Idle,
            StatusMachineState::Checking => AuthStatus::Checking,
            StatusMachineState::RequestingAccess => AuthStatus::RequestingAccess,
            StatusMachineState::Authenticating => AuthStatus::Authenticating,
            StatusMachineState::Authorized => AuthStatus::Authorized,
            StatusMachineState::Denied => AuthStatus::Denied,
            StatusMachineState::Unavailable => AuthStatus::Unavailable,
            StatusMachineState::Error => AuthStatus::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AuthStatus; 8] = [
        AuthStatus::Idle,
        AuthStatus::Checking,
        AuthStatus::RequestingAccess,
        AuthStatus::Authenticating,
        AuthStatus::Authorized,
        AuthStatus::Denied,
        AuthStatus::Unavailable,
        AuthStatus::Error,
    ];

    fn drive(inputs: &[StatusInput]) -> StatusMachine {
        let mut machine = StatusMachine::new();
        for input in inputs {
            machine.consume(input).unwrap();
        }
        machine
    }

    #[test]
    fn test_initial_state_is_idle() {
        let machine = StatusMachine::new();
        assert_eq!(*machine.state(), StatusMachineState::Idle);
    }

    #[test]
    fn test_authorized_flow_resets_to_idle() {
        let mut machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessPresent,
            StatusInput::AuthSucceeded,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Authorized);

        machine.consume(&StatusInput::Reset).unwrap();
        assert_eq!(*machine.state(), StatusMachineState::Idle);
    }

    #[test]
    fn test_access_request_inside_flow() {
        let machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessMissing,
            StatusInput::AccessGranted,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Authenticating);

        let machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessMissing,
            StatusInput::AccessRefused,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Denied);
    }

    #[test]
    fn test_standalone_access_request_settles_to_idle() {
        let machine = drive(&[StatusInput::RequestAccess, StatusInput::AccessSettled]);
        assert_eq!(*machine.state(), StatusMachineState::Idle);
    }

    #[test]
    fn test_fallback_paths() {
        let machine = drive(&[
            StatusInput::Check,
            StatusInput::NotAvailable,
            StatusInput::FallbackDone,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Idle);

        let machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessMissing,
            StatusInput::AccessRefused,
            StatusInput::WorkFailed,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Error);
    }

    #[test]
    fn test_authenticate_failures() {
        let machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessPresent,
            StatusInput::AuthRejected,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Denied);

        let machine = drive(&[
            StatusInput::Check,
            StatusInput::AccessPresent,
            StatusInput::AuthFailed,
        ]);
        assert_eq!(*machine.state(), StatusMachineState::Error);
    }

    #[test]
    fn test_cannot_authorize_without_checking() {
        let mut machine = StatusMachine::new();
        assert!(machine.consume(&StatusInput::AuthSucceeded).is_err());
        assert!(machine.consume(&StatusInput::Reset).is_err());
        assert_eq!(*machine.state(), StatusMachineState::Idle);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut machine = drive(&[StatusInput::WorkFailed]);
        assert_eq!(*machine.state(), StatusMachineState::Error);
        assert!(machine.consume(&StatusInput::Check).is_err());
        assert!(machine.consume(&StatusInput::Reset).is_err());
    }

    #[test]
    fn test_is_processing_exactly_for_waiting_states() {
        for status in ALL {
            let expected = matches!(
                status,
                AuthStatus::Checking | AuthStatus::RequestingAccess | AuthStatus::Authenticating
            );
            assert_eq!(status.is_processing(), expected, "{status}");
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_machine_state_conversion() {
        assert_eq!(
            AuthStatus::from(&StatusMachineState::RequestingAccess),
            AuthStatus::RequestingAccess
        );
        assert_eq!(
            AuthStatus::from(&StatusMachineState::Unavailable),
            AuthStatus::Unavailable
        );
        assert_eq!(AuthStatus::from(&StatusMachineState::Error), AuthStatus::Error);
    }
}
