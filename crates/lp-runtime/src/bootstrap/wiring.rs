//! Dependency wiring for the readiness runtime.
//! 就绪运行时的依赖装配。

use std::sync::Arc;

use lp_app::{PerformInstallation, ReadinessMount, ReadinessMountDeps};
use lp_core::ports::{HealthProbePort, InstallerPort, ReadinessUiPort};
use lp_core::ReadinessConfig;
use lp_infra::backend::locator_from_config;
use lp_infra::{FileSessionStore, HttpHealthProbe, ProcessInstaller, SystemClock};
use tracing::debug;

use super::AppPaths;
use crate::adapters::LoggingReadinessUi;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency construction
/// 依赖构造错误
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Session store initialization failed: {0}")]
    SessionInit(String),

    #[error("Health probe initialization failed: {0}")]
    ProbeInit(String),
}

/// Everything one application session needs, already wired.
pub struct ReadinessRuntime {
    pub mount: Arc<ReadinessMount>,
    pub installer: Arc<ProcessInstaller>,
    pub session: Arc<FileSessionStore>,
    pub ui: Arc<LoggingReadinessUi>,
    pub install: Arc<PerformInstallation>,
}

/// Wire the readiness coordinator to its infrastructure adapters.
///
/// Must be called from within a tokio runtime; the readiness dispatcher is
/// started here.
///
/// # Errors / 错误
///
/// Returns `WiringError` if the session file cannot be loaded or the HTTP
/// client cannot be built.
pub async fn wire_readiness(
    config: &ReadinessConfig,
    paths: &AppPaths,
) -> WiringResult<ReadinessRuntime> {
    let session_file = config
        .session
        .state_file
        .clone()
        .unwrap_or_else(|| paths.session_file.clone());
    let session = Arc::new(
        FileSessionStore::open(session_file)
            .await
            .map_err(|e| WiringError::SessionInit(format!("{e:#}")))?,
    );

    let probe: Arc<dyn HealthProbePort> = Arc::new(
        HttpHealthProbe::from_config(&config.backend, &config.poller)
            .map_err(|e| WiringError::ProbeInit(format!("{e:#}")))?,
    );
    let locator = locator_from_config(&config.backend, paths.backend_port_file.clone());

    let installer = Arc::new(ProcessInstaller::from_config(
        &config.installer,
        paths.install_marker.clone(),
    ));
    debug!(marker = %installer.marker_file().display(), "installer wired");

    let ui = Arc::new(LoggingReadinessUi::new());
    let install = Arc::new(PerformInstallation::new(
        Arc::clone(&installer) as Arc<dyn InstallerPort>
    ));

    let mount = Arc::new(ReadinessMount::new(ReadinessMountDeps {
        installer: installer.clone(),
        installer_events: installer.clone(),
        locator,
        probe,
        ui: Arc::clone(&ui) as Arc<dyn ReadinessUiPort>,
        session: session.clone(),
        clock: Arc::new(SystemClock),
        poller: config.poller.clone(),
    }));

    Ok(ReadinessRuntime {
        mount,
        installer,
        session,
        ui,
        install,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_core::ReadinessState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn wires_a_mountable_runtime() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::from_data_dir(temp_dir.path());
        let config = ReadinessConfig::default();

        let runtime = wire_readiness(&config, &paths).await.unwrap();
        let report = runtime.mount.mount().await;

        assert_eq!(report.tool_installed, Some(false));
        assert_eq!(report.installing, Some(false));
        assert_eq!(runtime.mount.state(), ReadinessState::NotReady);
        assert_eq!(runtime.installer.marker_file(), paths.install_marker.as_path());

        runtime.mount.teardown();
        assert!(!runtime.mount.is_mounted());
    }

    #[tokio::test]
    async fn broken_session_file_fails_wiring() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::from_data_dir(temp_dir.path());
        std::fs::write(&paths.session_file, "{not json").unwrap();

        let result = wire_readiness(&ReadinessConfig::default(), &paths).await;
        assert!(matches!(result, Err(WiringError::SessionInit(_))));
    }
}
