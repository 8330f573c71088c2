//! gate-sim binary entry point.
//!
//! Usage: gate-sim [--mode with|require] [--unavailable] [--no-access]
//!                 [--deny-access] [--auth authorized|failed|error]
//!                 [--biometry-disabled] [--work-fails] [--reason <text>]
//!
//! Runs one gated action against a simulated host, prints the outcome as
//! JSON on stdout and exits non-zero when the action did not succeed.

mod host;

use anyhow::Context;
use app_settings::{CloudSyncStorage, FileStore, SettingsStore};
use biometric_gate::{
    AuthOutcome, BiometricAuthCoordinator, GateConfig, Haptics, HostNotifier, ImpactStyle,
};
use clap::{Parser, ValueEnum};
use gate_config_and_utils::{init_logging, Config, Paths};
use host::{AuthBehavior, ConsoleHaptics, ConsolePopup, FileCloud, HostScript, SimulatedBiometry};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Gate policy to run the action under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Best-effort: fall back to running the action
    With,
    /// Strict: the action runs only after authorization
    Require,
}

/// Simulated sensor answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AuthArg {
    Authorized,
    Failed,
    Error,
}

impl From<AuthArg> for AuthBehavior {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Authorized => AuthBehavior::Authorized,
            AuthArg::Failed => AuthBehavior::Failed,
            AuthArg::Error => AuthBehavior::Error,
        }
    }
}

/// gate-sim: run a biometric-gated action against a simulated Mini App host.
#[derive(Parser, Debug)]
#[command(name = "gate-sim")]
#[command(about = "Run a biometric-gated action against a simulated Mini App host")]
#[command(version)]
struct Args {
    /// Gate policy
    #[arg(long, value_enum, default_value = "with")]
    mode: Mode,

    /// Host has no usable biometry
    #[arg(long)]
    unavailable: bool,

    /// Access has not been granted yet
    #[arg(long)]
    no_access: bool,

    /// Refuse the access prompt
    #[arg(long)]
    deny_access: bool,

    /// How the biometric prompt resolves
    #[arg(long, value_enum, default_value = "authorized")]
    auth: AuthArg,

    /// Persist biometry as disabled in settings before running
    #[arg(long, conflicts_with = "biometry_enabled")]
    biometry_disabled: bool,

    /// Persist biometry as enabled in settings before running
    #[arg(long)]
    biometry_enabled: bool,

    /// Make the gated action fail
    #[arg(long)]
    work_fails: bool,

    /// Reason shown in the biometric prompt
    #[arg(long, default_value = "Confirm action")]
    reason: String,

    /// Simulated prompt latency in milliseconds
    #[arg(long, default_value = "150")]
    prompt_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TMA_GATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Base directory for config, storage and logs. Defaults to ~/.tma-gate
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

impl Args {
    fn host_script(&self) -> HostScript {
        HostScript {
            available: !self.unavailable,
            access_granted: !self.no_access,
            grant_access: !self.deny_access,
            auth: self.auth.into(),
            prompt_delay: std::time::Duration::from_millis(self.prompt_delay_ms),
        }
    }

    /// Settings change requested on the command line, if any.
    fn biometry_override(&self) -> Option<bool> {
        if self.biometry_disabled {
            Some(false)
        } else if self.biometry_enabled {
            Some(true)
        } else {
            None
        }
    }
}

async fn perform_action(reason: String, fails: bool) -> Result<Value, String> {
    if fails {
        return Err("Simulated action failure".to_string());
    }
    Ok(json!({
        "action": reason,
        "performedAt": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn run(args: Args) -> anyhow::Result<AuthOutcome<Value>> {
    let paths = match &args.base_dir {
        Some(base) => Paths::with_base_dir(base.clone()),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths).context("loading config")?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    init_logging("gate-sim", &config, &paths);
    paths.ensure_dirs()?;

    // Settings: local file first, simulated cloud mirror second
    let storage = CloudSyncStorage::new(
        Arc::new(FileStore::new(paths.local_storage_file())),
        Arc::new(FileCloud::new(paths.cloud_storage_file())),
    );
    let settings = Arc::new(SettingsStore::new(Arc::new(storage)));
    settings.hydrate().await.context("loading settings")?;
    if let Some(enabled) = args.biometry_override() {
        settings
            .set_biometry_enabled(enabled)
            .await
            .context("saving settings")?;
    }
    info!(settings = ?settings.get(), "Settings loaded");

    let engine = Arc::new(ConsoleHaptics);
    let notifier = Arc::new(HostNotifier::new(engine.clone(), Arc::new(ConsolePopup)));
    let provider = Arc::new(SimulatedBiometry::new(args.host_script()));

    let gate = BiometricAuthCoordinator::with_config(
        provider,
        notifier,
        settings.clone(),
        GateConfig::from(&config),
    );

    if !gate.ensure_mounted().await {
        info!("Biometry bridge not mounted");
    }

    // The button press that starts the action
    Haptics::new(engine, settings).impact(ImpactStyle::default());

    let reason = args.reason.clone();
    let fails = args.work_fails;
    let work = move || perform_action(reason, fails);

    let outcome = match args.mode {
        Mode::With => gate.with_auth(work, &args.reason).await,
        Mode::Require => gate.require_auth(work, &args.reason).await,
    };

    Ok(outcome)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let outcome = run(args).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["gate-sim"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.mode, Mode::With);
        assert_eq!(args.auth, AuthArg::Authorized);
        assert_eq!(args.reason, "Confirm action");
        assert_eq!(args.biometry_override(), None);

        let script = args.host_script();
        assert!(script.available);
        assert!(script.access_granted);
        assert!(script.grant_access);
    }

    #[test]
    fn test_scenario_flags() {
        let args = parse(&[
            "--mode",
            "require",
            "--no-access",
            "--deny-access",
            "--auth",
            "error",
            "--biometry-disabled",
        ]);
        assert_eq!(args.mode, Mode::Require);
        assert_eq!(args.biometry_override(), Some(false));

        let script = args.host_script();
        assert!(!script.access_granted);
        assert!(!script.grant_access);
        assert_eq!(script.auth, AuthBehavior::Error);
    }

    #[test]
    fn test_biometry_flags_conflict() {
        let result =
            Args::try_parse_from(["gate-sim", "--biometry-disabled", "--biometry-enabled"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_authorized_with_auth() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let args = parse(&["--base-dir", base, "--prompt-delay-ms", "0"]);

        let outcome = run(args).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.status, biometric_gate::AuthStatus::Authorized);
        let result = outcome.result.unwrap();
        assert_eq!(result["action"], "Confirm action");
    }

    #[tokio::test]
    async fn test_run_require_auth_unavailable() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let args = parse(&[
            "--base-dir",
            base,
            "--mode",
            "require",
            "--unavailable",
            "--prompt-delay-ms",
            "0",
        ]);

        let outcome = run(args).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.status, biometric_gate::AuthStatus::Unavailable);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Biometry not available on this device")
        );
    }

    #[tokio::test]
    async fn test_corrupt_local_storage_uses_cloud_copy() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("local-storage.json"), "[1, 2").unwrap();
        std::fs::write(
            dir.path().join("cloud-storage.json"),
            serde_json::to_string(&json!({
                "app-settings": r#"{"state":{"hapticsEnabled":true,"biometryEnabled":false},"version":0}"#
            }))
            .unwrap(),
        )
        .unwrap();

        let args = parse(&["--base-dir", base, "--auth", "failed", "--prompt-delay-ms", "0"]);
        let outcome = run(args).await.unwrap();

        // Biometry disabled by the cloud copy: the action runs ungated
        assert!(outcome.success);
        assert_eq!(outcome.status, biometric_gate::AuthStatus::Idle);
        let local = std::fs::read_to_string(dir.path().join("local-storage.json")).unwrap();
        assert!(local.contains("biometryEnabled"));
    }

    #[tokio::test]
    async fn test_disabled_biometry_is_persisted() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();

        let first = parse(&["--base-dir", base, "--biometry-disabled", "--auth", "failed"]);
        let outcome = run(first).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.status, biometric_gate::AuthStatus::Idle);

        // Next run has no flag but reads the stored setting
        let second = parse(&["--base-dir", base, "--auth", "failed"]);
        let outcome = run(second).await.unwrap();
        assert_eq!(outcome.status, biometric_gate::AuthStatus::Idle);

        let local = std::fs::read_to_string(dir.path().join("local-storage.json")).unwrap();
        assert!(local.contains("biometryEnabled"));
    }
}
