//! Behavioral tests for the biometric coordinator.
//!
//! - `harness.rs`        - Scripted host provider and recording notifier
//! - `with_auth.rs`      - Best-effort gate: bypass, fallbacks, authenticate outcomes
//! - `require_auth.rs`   - Strict gate: every failure notifies, work never runs
//! - `request_access.rs` - Standalone access requests and capability queries
//! - `status.rs`         - Status board: processing flag, reset timer, overlapping flows
