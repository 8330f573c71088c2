//! Terminal value of a gated flow.

use crate::{AuthStatus, GateError};
use serde::Serialize;

/// What a gated flow hands back to its caller.
///
/// `result` is present only when the wrapped work ran and succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome<T> {
    pub success: bool,
    pub status: AuthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> AuthOutcome<T> {
    /// The work ran and returned `result`; `status` says how the gate was passed.
    pub fn completed(status: AuthStatus, result: T) -> Self {
        Self {
            success: true,
            status,
            error: None,
            result: Some(result),
        }
    }

    pub fn failed(error: &GateError) -> Self {
        Self {
            success: false,
            status: error.status(),
            error: Some(error.to_string()),
            result: None,
        }
    }

    /// Convert into a plain `Result`, keeping the error message.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.result)
        } else {
            Err(self.error.unwrap_or_else(|| self.status.to_string()))
        }
    }
}
