//! Status board and per-invocation flows.
//!
//! Each gated call owns a [`Flow`] with a private status machine. Starting a
//! flow claims the shared [`StatusBoard`]; from then on only that flow's
//! transitions are shown, so overlapping calls cannot interleave statuses.

use crate::status_fsm::{StatusInput, StatusMachine};
use crate::{AuthStatus, GateError, GateResult};
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// What the UI sees: the status of the most recently started flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Flow currently shown, `None` before the first flow.
    pub flow_id: Option<Uuid>,
    pub status: AuthStatus,
    /// Last error reported by the shown flow.
    pub error: Option<String>,
}

impl StatusSnapshot {
    fn initial() -> Self {
        Self {
            flow_id: None,
            status: AuthStatus::Idle,
            error: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.status.is_processing()
    }
}

/// Single-writer view of the latest flow.
pub(crate) struct StatusBoard {
    tx: watch::Sender<StatusSnapshot>,
}

impl StatusBoard {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::initial());
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    fn claim(&self, flow_id: Uuid) {
        self.tx.send_modify(|snapshot| {
            *snapshot = StatusSnapshot {
                flow_id: Some(flow_id),
                status: AuthStatus::Idle,
                error: None,
            }
        });
    }

    /// Returns false when a newer flow owns the board.
    fn publish(&self, flow_id: Uuid, status: AuthStatus, error: Option<String>) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.flow_id != Some(flow_id) {
                return false;
            }
            snapshot.status = status;
            if error.is_some() {
                snapshot.error = error;
            }
            true
        })
    }
}

/// One gated invocation.
pub(crate) struct Flow {
    id: Uuid,
    machine: StatusMachine,
    board: Weak<StatusBoard>,
}

impl Flow {
    pub(crate) fn start(board: &Arc<StatusBoard>) -> Self {
        let id = Uuid::new_v4();
        board.claim(id);
        Self {
            id,
            machine: StatusMachine::new(),
            board: Arc::downgrade(board),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn status(&self) -> AuthStatus {
        AuthStatus::from(self.machine.state())
    }

    pub(crate) fn advance(&mut self, input: StatusInput) -> GateResult<AuthStatus> {
        self.transition(input, None)
    }

    /// Transition and record `error` as the flow's last error.
    pub(crate) fn fail(&mut self, input: StatusInput, error: &GateError) -> GateResult<AuthStatus> {
        self.transition(input, Some(error.to_string()))
    }

    fn transition(&mut self, input: StatusInput, error: Option<String>) -> GateResult<AuthStatus> {
        let old_status = self.status();

        self.machine.consume(&input).map_err(|_| {
            GateError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.machine.state()
            ))
        })?;

        let new_status = self.status();
        debug!(
            flow_id = %self.id,
            old_status = %old_status,
            new_status = %new_status,
            "Biometric status transition"
        );

        if let Some(board) = self.board.upgrade() {
            if !board.publish(self.id, new_status, error) {
                trace!(flow_id = %self.id, "Flow superseded, status not shown");
            }
        }

        Ok(new_status)
    }

    /// Move `authorized` back to `idle` after `delay`.
    ///
    /// The timer is never cancelled. Once the coordinator is gone, or a newer
    /// flow owns the board, firing it changes nothing visible.
    pub(crate) fn schedule_reset(mut self, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = self.advance(StatusInput::Reset) {
                warn!(flow_id = %self.id, error = %e, "Status reset skipped");
            }
        });
    }
}
