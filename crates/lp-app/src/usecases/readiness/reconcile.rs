//! Mount-time reconciliation.
//!
//! 启动时查询安装器的当前状态，避免重复安装或卡在空状态。
//! Queries the installer once per process so that a restarted UI picks up an
//! existing installation (or one still running) instead of starting over.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lp_core::ports::{InstallerPort, ReadinessUiPort};
use lp_core::ReadinessEvent;
use tracing::{info, info_span, warn, Instrument};

use super::ReadinessInbox;

/// What one reconciliation run found. `None` means the query failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `false` when the run was skipped because reconciliation already happened.
    pub ran: bool,
    pub tool_installed: Option<bool>,
    pub installing: Option<bool>,
    pub stage_reset: bool,
}

pub struct MountReconciliation {
    installer: Arc<dyn InstallerPort>,
    ui: Arc<dyn ReadinessUiPort>,
    inbox: ReadinessInbox,
    has_checked: AtomicBool,
}

impl MountReconciliation {
    pub fn new(
        installer: Arc<dyn InstallerPort>,
        ui: Arc<dyn ReadinessUiPort>,
        inbox: ReadinessInbox,
    ) -> Self {
        Self {
            installer,
            ui,
            inbox,
            has_checked: AtomicBool::new(false),
        }
    }

    pub fn has_checked(&self) -> bool {
        self.has_checked.load(Ordering::SeqCst)
    }

    /// Run reconciliation. Only the first call does any work.
    pub async fn run(&self) -> ReconcileReport {
        if self.has_checked.swap(true, Ordering::SeqCst) {
            return ReconcileReport::default();
        }

        let span = info_span!("usecase.readiness.reconcile");
        async {
            let mut report = ReconcileReport {
                ran: true,
                ..ReconcileReport::default()
            };

            report.tool_installed = self.query_tool_installed().await;
            if report.tool_installed == Some(true) {
                self.inbox.notify(ReadinessEvent::ToolsAlreadyInstalled).await;
            }
            if report.tool_installed == Some(false) {
                report.stage_reset = self.reset_onboarding_stage().await;
            }

            report.installing = self.query_installing().await;
            if report.installing == Some(true) {
                self.inbox
                    .notify(ReadinessEvent::InstallationInProgress)
                    .await;
            }

            info!(
                tool_installed = ?report.tool_installed,
                installing = ?report.installing,
                stage_reset = report.stage_reset,
                "mount reconciliation finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn query_tool_installed(&self) -> Option<bool> {
        match self.installer.check_tool_installed().await {
            Ok(status) if status.success => Some(status.is_installed),
            Ok(_) => {
                warn!("tool install check reported failure, state unknown");
                None
            }
            Err(err) => {
                warn!(error = %err, "tool install check failed, state unknown");
                None
            }
        }
    }

    async fn query_installing(&self) -> Option<bool> {
        match self.installer.installation_status().await {
            Ok(status) if status.success => Some(status.is_installing),
            Ok(_) => {
                warn!("installation status query reported failure, state unknown");
                None
            }
            Err(err) => {
                warn!(error = %err, "installation status query failed, state unknown");
                None
            }
        }
    }

    /// Only called when the check succeeded and said "not installed".
    async fn reset_onboarding_stage(&self) -> bool {
        let stage = match self.ui.init_stage().await {
            Ok(stage) => stage,
            Err(err) => {
                warn!(error = %err, "failed to read onboarding stage");
                return false;
            }
        };

        let Some(next) = stage.resume_after_install_check(false) else {
            return false;
        };
        match self.ui.set_init_stage(next).await {
            Ok(()) => {
                info!(from = ?stage, to = ?next, "onboarding stage reset, tools not installed");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to reset onboarding stage");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::readiness::readiness_channel;
    use async_trait::async_trait;
    use lp_core::onboarding::InitStage;
    use lp_core::ports::{InstallationStatus, ToolInstallStatus};
    use lp_core::readiness::InstallLogEntry;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct StubInstaller {
        installed: anyhow::Result<bool>,
        installing: anyhow::Result<bool>,
        checks: AtomicUsize,
    }

    impl StubInstaller {
        fn new(installed: anyhow::Result<bool>, installing: anyhow::Result<bool>) -> Arc<Self> {
            Arc::new(Self {
                installed,
                installing,
                checks: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InstallerPort for StubInstaller {
        async fn check_tool_installed(&self) -> anyhow::Result<ToolInstallStatus> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            match &self.installed {
                Ok(is_installed) => Ok(ToolInstallStatus {
                    success: true,
                    is_installed: *is_installed,
                }),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }

        async fn installation_status(&self) -> anyhow::Result<InstallationStatus> {
            match &self.installing {
                Ok(is_installing) => Ok(InstallationStatus {
                    success: true,
                    is_installing: *is_installing,
                }),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }

        async fn perform_installation(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct StageUi {
        stage: Mutex<InitStage>,
    }

    impl StageUi {
        fn at(stage: InitStage) -> Arc<Self> {
            Arc::new(Self {
                stage: Mutex::new(stage),
            })
        }

        fn current(&self) -> InitStage {
            *self.stage.lock().unwrap()
        }
    }

    #[async_trait]
    impl ReadinessUiPort for StageUi {
        async fn start_installation(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn add_log(&self, _entry: InstallLogEntry) -> anyhow::Result<()> {
            Ok(())
        }
        async fn set_success(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn set_error(&self, _message: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn set_backend_error(&self, _message: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn set_waiting_backend(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn init_stage(&self) -> anyhow::Result<InitStage> {
            Ok(self.current())
        }
        async fn set_init_stage(&self, stage: InitStage) -> anyhow::Result<()> {
            *self.stage.lock().unwrap() = stage;
            Ok(())
        }
    }

    #[tokio::test]
    async fn installed_tools_mark_installation_complete() {
        let (inbox, mut rx) = readiness_channel(8);
        let installer = StubInstaller::new(Ok(true), Ok(false));
        let ui = StageUi::at(InitStage::Permissions);
        let reconcile = MountReconciliation::new(installer, ui.clone(), inbox);

        let report = reconcile.run().await;

        assert!(report.ran);
        assert_eq!(report.tool_installed, Some(true));
        assert!(!report.stage_reset);
        assert_eq!(ui.current(), InitStage::Permissions);
        assert_eq!(rx.try_recv().unwrap(), ReadinessEvent::ToolsAlreadyInstalled);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn permissions_stage_falls_back_when_not_installed() {
        let (inbox, _rx) = readiness_channel(8);
        let installer = StubInstaller::new(Ok(false), Ok(false));
        let ui = StageUi::at(InitStage::Permissions);
        let reconcile = MountReconciliation::new(installer, ui.clone(), inbox);

        let report = reconcile.run().await;

        assert!(report.stage_reset);
        assert_eq!(ui.current(), InitStage::Carousel);
    }

    #[tokio::test]
    async fn running_installation_is_picked_up() {
        let (inbox, mut rx) = readiness_channel(8);
        let installer = StubInstaller::new(Ok(false), Ok(true));
        let reconcile =
            MountReconciliation::new(installer, StageUi::at(InitStage::Carousel), inbox);

        let report = reconcile.run().await;

        assert_eq!(report.installing, Some(true));
        assert_eq!(rx.try_recv().unwrap(), ReadinessEvent::InstallationInProgress);
    }

    #[tokio::test]
    async fn query_errors_degrade_to_unknown() {
        let (inbox, mut rx) = readiness_channel(8);
        let installer = StubInstaller::new(
            Err(anyhow::anyhow!("ipc unavailable")),
            Err(anyhow::anyhow!("ipc unavailable")),
        );
        let ui = StageUi::at(InitStage::Permissions);
        let reconcile = MountReconciliation::new(installer, ui.clone(), inbox);

        let report = reconcile.run().await;

        assert!(report.ran);
        assert_eq!(report.tool_installed, None);
        assert_eq!(report.installing, None);
        assert_eq!(ui.current(), InitStage::Permissions);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let (inbox, mut rx) = readiness_channel(8);
        let installer = StubInstaller::new(Ok(true), Ok(false));
        let reconcile = MountReconciliation::new(
            installer.clone(),
            StageUi::at(InitStage::Carousel),
            inbox,
        );

        assert!(reconcile.run().await.ran);
        assert!(!reconcile.run().await.ran);
        assert!(reconcile.has_checked());
        assert_eq!(installer.checks.load(Ordering::SeqCst), 1);

        assert_eq!(rx.try_recv().unwrap(), ReadinessEvent::ToolsAlreadyInstalled);
        assert!(rx.try_recv().is_err());
    }
}
