use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lp_app::usecases::ReconcileReport;
use lp_app::{PerformInstallation, ReadinessError, ReadinessMount};
use lp_core::{PollReason, ReadinessConfig, ReadinessState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{wire_readiness, AppPaths};

/// How long to wait for the install outcome to reach the coordinator.
const INSTALL_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run one application session until Ctrl+C.
///
/// Mounts readiness, starts the installation when the tools are missing and
/// auto-install is enabled, then waits for shutdown and tears everything down.
pub async fn run_app(config: ReadinessConfig, paths: AppPaths) -> anyhow::Result<()> {
    let runtime = wire_readiness(&config, &paths)
        .await
        .context("Failed to wire readiness runtime")?;

    let state_logger = spawn_state_logger(runtime.mount.subscribe());
    let report = runtime.mount.mount().await;

    let installation = if config.installer.auto_install && should_auto_install(&report) {
        let install = Arc::clone(&runtime.install);
        let mount = Arc::clone(&runtime.mount);
        Some(tokio::spawn(async move {
            if let Err(err) = install_and_await_backend(&install, &mount).await {
                warn!(error = %err, "automatic installation did not complete");
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!(state = ?runtime.mount.state(), "shutting down");

    if let Some(installation) = installation {
        installation.abort();
    }
    runtime.mount.teardown();
    state_logger.abort();
    Ok(())
}

/// Install the missing tools, then poll for the backend they bring up.
///
/// Returns whether an installation ran. Polling starts once the install
/// outcome has been applied, and not at all when the installation failed.
pub(crate) async fn install_and_await_backend(
    install: &PerformInstallation,
    mount: &ReadinessMount,
) -> Result<bool, ReadinessError> {
    if !install.ensure_installed().await? {
        return Ok(false);
    }

    let mut states = mount.subscribe();
    let settled = tokio::time::timeout(
        INSTALL_SETTLE_TIMEOUT,
        states.wait_for(|state| {
            !matches!(state, ReadinessState::NotReady | ReadinessState::Installing)
        }),
    )
    .await
    .is_ok_and(|changed| changed.is_ok());
    if !settled {
        warn!("install outcome not observed, polling for the backend anyway");
    }

    if let ReadinessState::InstallationFailed { .. } = mount.state() {
        return Ok(true);
    }
    mount.start_polling(PollReason::Manual).await;
    Ok(true)
}

/// Install only when the tools are known to be missing and nothing is running.
fn should_auto_install(report: &ReconcileReport) -> bool {
    report.tool_installed == Some(false) && report.installing != Some(true)
}

fn spawn_state_logger(mut states: watch::Receiver<ReadinessState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match &state {
                ReadinessState::Ready => info!("application ready"),
                ReadinessState::InstallationFailed { reason } => {
                    warn!(%reason, "application blocked by installation failure")
                }
                ReadinessState::BackendFailed { reason } => {
                    warn!(%reason, "application blocked by backend failure")
                }
                other => info!(state = ?other, "readiness changed"),
            }
        }
    })
}
