//! Use case for installing local dependencies
//! 安装本地依赖的用例

use std::sync::Arc;

use lp_core::ports::InstallerPort;
use tracing::{info, info_span, Instrument};

use crate::usecases::readiness::ReadinessError;

/// Use case for running the dependency installation.
///
/// ## Behavior / 行为
/// - `execute` always asks the installer to run
/// - `ensure_installed` only runs it when the tools are missing
///
/// Progress and the final outcome arrive through the installer event stream,
/// not through the return value.
pub struct PerformInstallation {
    installer: Arc<dyn InstallerPort>,
}

impl PerformInstallation {
    pub fn new(installer: Arc<dyn InstallerPort>) -> Self {
        Self { installer }
    }

    pub async fn execute(&self) -> Result<(), ReadinessError> {
        self.installer
            .perform_installation()
            .instrument(info_span!("usecase.install.perform"))
            .await
            .map_err(ReadinessError::Installer)
    }

    /// Install when the tools are missing or their state is unknown.
    ///
    /// # Returns / 返回值
    /// - `Ok(true)` if an installation was run
    /// - `Ok(false)` if the tools were already installed
    pub async fn ensure_installed(&self) -> Result<bool, ReadinessError> {
        let installed = self
            .installer
            .check_tool_installed()
            .await
            .map(|status| status.success && status.is_installed)
            .map_err(ReadinessError::Installer)?;
        if installed {
            info!("tools already installed, skipping installation");
            return Ok(false);
        }

        self.execute().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lp_core::ports::{InstallationStatus, ToolInstallStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockInstaller {
        installed: bool,
        fail_with: Option<&'static str>,
        runs: AtomicUsize,
    }

    impl MockInstaller {
        fn new(installed: bool, fail_with: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                installed,
                fail_with,
                runs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InstallerPort for MockInstaller {
        async fn check_tool_installed(&self) -> anyhow::Result<ToolInstallStatus> {
            Ok(ToolInstallStatus {
                success: true,
                is_installed: self.installed,
            })
        }

        async fn installation_status(&self) -> anyhow::Result<InstallationStatus> {
            Ok(InstallationStatus {
                success: true,
                is_installing: false,
            })
        }

        async fn perform_installation(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn ensure_installed_skips_when_tools_present() {
        let installer = MockInstaller::new(true, None);
        let use_case = PerformInstallation::new(installer.clone());

        assert!(!use_case.ensure_installed().await.unwrap());
        assert_eq!(installer.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ensure_installed_runs_when_tools_missing() {
        let installer = MockInstaller::new(false, None);
        let use_case = PerformInstallation::new(installer.clone());

        assert!(use_case.ensure_installed().await.unwrap());
        assert_eq!(installer.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn installer_errors_are_wrapped() {
        let installer = MockInstaller::new(false, Some("installation already running"));
        let use_case = PerformInstallation::new(installer);

        let err = use_case.execute().await.unwrap_err();
        assert!(matches!(err, ReadinessError::Installer(_)));
        assert!(err.to_string().contains("installation already running"));
    }
}
