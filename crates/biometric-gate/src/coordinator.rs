//! Biometric authentication coordinator.
//!
//! Sequences the availability check, the one-time access grant and the
//! authenticate call around a unit of work. Two policies are offered:
//!
//! - [`BiometricAuthCoordinator::with_auth`] is best-effort: when biometry is
//!   disabled, unavailable or refused, the work still runs.
//! - [`BiometricAuthCoordinator::require_auth`] is strict: the work runs only
//!   after an authorized authenticate call.
//!
//! Every invocation drives its own status machine (see [`crate::flow`]); the
//! status observed through [`BiometricAuthCoordinator::subscribe`] is the one
//! of the most recently started invocation.

use crate::flow::{Flow, StatusBoard, StatusSnapshot};
use crate::status_fsm::StatusInput;
use crate::{
    AuthOutcome, AuthStatus, CapabilityProvider, CapabilityState, GateError, GateResult,
    HapticKind, HostError, Notifier, ERROR_MODAL_TITLE,
};
use app_settings::SettingsSource;
use gate_config_and_utils::{
    Config, DEFAULT_REQUIRE_AUTH_ACCESS_REASON, DEFAULT_RESET_DELAY_MS,
    DEFAULT_WITH_AUTH_ACCESS_REASON,
};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Access prompt reason used when a caller passes an empty one.
const FALLBACK_ACCESS_REASON: &str = "Enable biometric authentication";

const MODAL_AUTH_FAILED: &str = "Biometric authentication failed. Please try again.";
const MODAL_AUTH_DENIED: &str = "Biometric authentication was denied. Please try again.";
const MODAL_UNAVAILABLE: &str = "Biometric authentication is not available on this device.";
const MODAL_ACCESS_DENIED: &str = "Biometric access was denied. Enable it in Settings.";

/// Coordinator tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// How long `authorized` stays visible before returning to `idle`.
    pub reset_delay: Duration,
    /// Access prompt reason used by `with_auth`.
    pub with_auth_access_reason: String,
    /// Access prompt reason used by `require_auth`.
    pub require_auth_access_reason: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_millis(DEFAULT_RESET_DELAY_MS),
            with_auth_access_reason: DEFAULT_WITH_AUTH_ACCESS_REASON.to_string(),
            require_auth_access_reason: DEFAULT_REQUIRE_AUTH_ACCESS_REASON.to_string(),
        }
    }
}

impl From<&Config> for GateConfig {
    fn from(config: &Config) -> Self {
        Self {
            reset_delay: config.reset_delay(),
            with_auth_access_reason: config.with_auth_access_reason.clone(),
            require_auth_access_reason: config.require_auth_access_reason.clone(),
        }
    }
}

/// Which gate policy a flow runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateMode {
    WithAuth,
    RequireAuth,
}

impl GateMode {
    fn name(self) -> &'static str {
        match self {
            GateMode::WithAuth => "with_auth",
            GateMode::RequireAuth => "require_auth",
        }
    }

    fn denied_error(self) -> &'static str {
        match self {
            GateMode::WithAuth => "Authentication failed",
            GateMode::RequireAuth => "Authentication denied",
        }
    }

    fn denied_modal(self) -> &'static str {
        match self {
            GateMode::WithAuth => MODAL_AUTH_FAILED,
            GateMode::RequireAuth => MODAL_AUTH_DENIED,
        }
    }
}

/// Wraps units of work with a biometric gate.
///
/// One coordinator per UI session. It owns no durable state: capability
/// state is re-queried from the provider on every flow and settings are
/// read at the start of each call.
pub struct BiometricAuthCoordinator {
    provider: Arc<dyn CapabilityProvider>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<dyn SettingsSource>,
    config: GateConfig,
    board: Arc<StatusBoard>,
}

impl BiometricAuthCoordinator {
    /// Create a coordinator with default tunables.
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self::with_config(provider, notifier, settings, GateConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn CapabilityProvider>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn SettingsSource>,
        config: GateConfig,
    ) -> Self {
        Self {
            provider,
            notifier,
            settings,
            config,
            board: Arc::new(StatusBoard::new()),
        }
    }

    // ========================================================================
    // Gated flows
    // ========================================================================

    /// Run `work` behind a best-effort biometric gate.
    ///
    /// Falls back to running `work` without confirmation when biometry is
    /// disabled in settings, unavailable, or the access grant is refused.
    /// A rejected or failed authenticate call does not run `work` and shows
    /// an error modal.
    pub async fn with_auth<T, E, F, Fut>(&self, work: F, reason: &str) -> AuthOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut flow = Flow::start(&self.board);
        let biometry_enabled = self.settings.current().biometry_enabled;
        debug!(flow_id = %flow.id(), reason, biometry_enabled, "Starting biometric flow");

        let result = self.with_auth_flow(&mut flow, work, reason, biometry_enabled).await;
        self.finish(flow, GateMode::WithAuth, result)
    }

    /// Run `work` only after an authorized authenticate call.
    ///
    /// Every failure path notifies the user. `biometry_enabled` is ignored.
    pub async fn require_auth<T, E, F, Fut>(&self, work: F, reason: &str) -> AuthOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut flow = Flow::start(&self.board);
        debug!(flow_id = %flow.id(), reason, "Starting required biometric flow");

        let result = self.require_auth_flow(&mut flow, work, reason).await;
        self.finish(flow, GateMode::RequireAuth, result)
    }

    async fn with_auth_flow<T, E, F, Fut>(
        &self,
        flow: &mut Flow,
        work: F,
        reason: &str,
        biometry_enabled: bool,
    ) -> GateResult<AuthOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if !biometry_enabled {
            debug!(flow_id = %flow.id(), "Biometry disabled in settings, running without gate");
            return self.run_fallback(flow, work, AuthStatus::Idle).await;
        }

        flow.advance(StatusInput::Check)?;
        let Some(state) = self.available_state(flow) else {
            debug!(flow_id = %flow.id(), "Biometry not available, running without gate");
            flow.advance(StatusInput::NotAvailable)?;
            return self.run_fallback(flow, work, AuthStatus::Unavailable).await;
        };

        if state.access_granted {
            flow.advance(StatusInput::AccessPresent)?;
        } else {
            flow.advance(StatusInput::AccessMissing)?;
            if self
                .acquire_access(&self.config.with_auth_access_reason)
                .await
            {
                flow.advance(StatusInput::AccessGranted)?;
            } else {
                debug!(flow_id = %flow.id(), "Access refused, running without gate");
                flow.advance(StatusInput::AccessRefused)?;
                return self.run_fallback(flow, work, AuthStatus::Denied).await;
            }
        }

        self.authenticate_and_run(flow, work, reason, GateMode::WithAuth)
            .await
    }

    async fn require_auth_flow<T, E, F, Fut>(
        &self,
        flow: &mut Flow,
        work: F,
        reason: &str,
    ) -> GateResult<AuthOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        flow.advance(StatusInput::Check)?;
        let Some(state) = self.available_state(flow) else {
            let err = GateError::Unavailable;
            flow.fail(StatusInput::NotAvailable, &err)?;
            self.show_error(MODAL_UNAVAILABLE);
            return Err(err);
        };

        if state.access_granted {
            flow.advance(StatusInput::AccessPresent)?;
        } else {
            flow.advance(StatusInput::AccessMissing)?;
            if self
                .acquire_access(&self.config.require_auth_access_reason)
                .await
            {
                flow.advance(StatusInput::AccessGranted)?;
            } else {
                let err = GateError::AccessDenied;
                flow.fail(StatusInput::AccessRefused, &err)?;
                self.pulse(HapticKind::Error);
                self.show_error(MODAL_ACCESS_DENIED);
                return Err(err);
            }
        }

        self.authenticate_and_run(flow, work, reason, GateMode::RequireAuth)
            .await
    }

    /// Authenticate, then run `work` on success. Status must be `authenticating`.
    async fn authenticate_and_run<T, E, F, Fut>(
        &self,
        flow: &mut Flow,
        work: F,
        reason: &str,
        mode: GateMode,
    ) -> GateResult<AuthOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        debug!(flow_id = %flow.id(), "Authenticating");

        match self.provider.authenticate(reason).await {
            Ok(response) if response.is_authorized() => {
                debug!(flow_id = %flow.id(), "Authorized, running work");
                match work().await {
                    Ok(result) => {
                        self.pulse(HapticKind::Success);
                        flow.advance(StatusInput::AuthSucceeded)?;
                        Ok(AuthOutcome::completed(AuthStatus::Authorized, result))
                    }
                    Err(e) => Err(self.work_failed(flow, e)),
                }
            }
            Ok(response) => {
                debug!(
                    flow_id = %flow.id(),
                    auth_status = ?response.status,
                    "Authentication not authorized"
                );
                let err = GateError::AuthDenied(mode.denied_error().to_string());
                self.pulse(HapticKind::Error);
                flow.fail(StatusInput::AuthRejected, &err)?;
                self.show_error(mode.denied_modal());
                Err(err)
            }
            Err(e) => {
                let err = GateError::Provider(e);
                warn!(flow_id = %flow.id(), error = %err, "Authenticate call failed");
                self.pulse(HapticKind::Error);
                flow.fail(StatusInput::AuthFailed, &err)?;
                self.show_error(&format!("Authentication error: {err}"));
                Err(err)
            }
        }
    }

    /// Run `work` without confirmation. The outcome reports `shown` on success.
    async fn run_fallback<T, E, F, Fut>(
        &self,
        flow: &mut Flow,
        work: F,
        shown: AuthStatus,
    ) -> GateResult<AuthOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match work().await {
            Ok(result) => {
                self.pulse(HapticKind::Success);
                if flow.status() != AuthStatus::Idle {
                    flow.advance(StatusInput::FallbackDone)?;
                }
                Ok(AuthOutcome::completed(shown, result))
            }
            Err(e) => Err(self.work_failed(flow, e)),
        }
    }

    fn work_failed(&self, flow: &mut Flow, cause: impl Display) -> GateError {
        let err = GateError::Work(cause.to_string());
        debug!(flow_id = %flow.id(), error = %err, "Work failed");
        if let Err(e) = flow.fail(StatusInput::WorkFailed, &err) {
            error!(flow_id = %flow.id(), error = %e, "Could not record work failure");
        }
        err
    }

    fn finish<T>(
        &self,
        flow: Flow,
        mode: GateMode,
        result: GateResult<AuthOutcome<T>>,
    ) -> AuthOutcome<T> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if matches!(e, GateError::InvalidStateTransition(_)) {
                    error!(flow_id = %flow.id(), error = %e, "Biometric flow aborted");
                }
                AuthOutcome::failed(&e)
            }
        };

        info!(
            flow_id = %flow.id(),
            mode = mode.name(),
            success = outcome.success,
            status = %outcome.status,
            "Biometric flow finished"
        );

        if flow.status() == AuthStatus::Authorized {
            flow.schedule_reset(self.config.reset_delay);
        }
        outcome
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Ask the user for the one-time access grant.
    ///
    /// Never fails: provider errors are logged and reported as `false`. The
    /// status shows `requesting_access` for the duration, then `idle`. While
    /// a gated flow is processing the board is left to that flow.
    pub async fn request_access(&self, reason: &str) -> bool {
        if self.board.snapshot().is_processing() {
            debug!("Gated flow in progress, access request not shown on the board");
            return self.acquire_access(reason).await;
        }

        let mut flow = Flow::start(&self.board);
        if let Err(e) = flow.advance(StatusInput::RequestAccess) {
            error!(flow_id = %flow.id(), error = %e, "Access request not tracked");
        }

        let granted = self.acquire_access(reason).await;

        if let Err(e) = flow.advance(StatusInput::AccessSettled) {
            error!(flow_id = %flow.id(), error = %e, "Access request not tracked");
        }
        granted
    }

    async fn acquire_access(&self, reason: &str) -> bool {
        let reason = if reason.is_empty() {
            FALLBACK_ACCESS_REASON
        } else {
            reason
        };

        let state = match self.provider.state() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Could not read biometry state before access request");
                return false;
            }
        };
        if state.access_granted {
            debug!("Access already granted");
            return true;
        }

        if !self.provider.request_access_available() {
            debug!("Access request not available");
            return false;
        }

        let granted = match self.provider.request_access(reason).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "Access request failed");
                return false;
            }
        };
        debug!(granted, "Access request finished");

        // Remount so the next state() reflects the grant
        if granted && self.provider.mount_available() {
            if let Err(e) = self.provider.mount().await {
                warn!(error = %e, "Remount after access grant failed");
            }
        }

        granted
    }

    // ========================================================================
    // Capability queries
    // ========================================================================

    /// Whether the biometry bridge is mounted and can authenticate.
    pub fn is_available(&self) -> bool {
        let mounted = self.provider.is_mounted();
        let authenticate_available = self.provider.authenticate_available();
        debug!(mounted, authenticate_available, "Biometry availability check");
        mounted && authenticate_available
    }

    /// Current host state, `None` if the host cannot report it.
    pub fn get_state(&self) -> Option<CapabilityState> {
        match self.provider.state() {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(error = %e, "Biometry state unavailable");
                None
            }
        }
    }

    fn available_state(&self, flow: &Flow) -> Option<CapabilityState> {
        if !self.is_available() {
            return None;
        }
        match self.provider.state() {
            Ok(state) => {
                debug!(
                    flow_id = %flow.id(),
                    access_granted = state.access_granted,
                    "Biometry state"
                );
                Some(state)
            }
            Err(e) => {
                warn!(flow_id = %flow.id(), error = %e, "Biometry state unreadable, treating as unavailable");
                None
            }
        }
    }

    /// Mount the biometry bridge if needed. Returns whether it is mounted.
    pub async fn ensure_mounted(&self) -> bool {
        if self.provider.is_mounted() {
            return true;
        }
        if !self.provider.mount_available() {
            debug!("Biometry mount not available");
            return false;
        }
        match self.provider.mount().await {
            Ok(()) => self.provider.is_mounted(),
            Err(e) => {
                warn!(error = %e, "Biometry mount failed");
                false
            }
        }
    }

    pub fn can_open_settings(&self) -> bool {
        self.provider.open_settings_available()
    }

    /// Open the host's biometry settings.
    ///
    /// Must be called from a user gesture handler.
    pub fn open_settings(&self) -> bool {
        if !self.can_open_settings() {
            debug!("Opening biometry settings not available");
            return false;
        }
        match self.provider.open_settings() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Opening biometry settings failed");
                false
            }
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn status(&self) -> AuthStatus {
        self.board.snapshot().status
    }

    /// Last error recorded by the most recent flow.
    pub fn last_error(&self) -> Option<String> {
        self.board.snapshot().error
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.board.snapshot()
    }

    /// Observe status changes of the most recent flow.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.board.subscribe()
    }

    /// True while a flow is waiting on the host.
    pub fn is_processing(&self) -> bool {
        self.status().is_processing()
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    fn pulse(&self, kind: HapticKind) {
        if !self.settings.current().haptics_enabled {
            return;
        }
        match self.notifier.haptic_pulse(kind) {
            Ok(()) => {}
            Err(HostError::Unsupported(call)) => debug!(call = %call, "Haptic pulse not supported"),
            Err(e) => warn!(error = %e, "Haptic pulse failed"),
        }
    }

    fn show_error(&self, message: &str) {
        match self.notifier.show_error_modal(ERROR_MODAL_TITLE, message) {
            Ok(()) => {}
            Err(HostError::Unsupported(call)) => {
                debug!(call = %call, modal = message, "Error modal not supported")
            }
            Err(e) => warn!(error = %e, modal = message, "Error modal failed"),
        }
    }
}
