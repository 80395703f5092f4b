//! Headless readiness UI adapter.
//!
//! Keeps the onboarding stage and the installer log in memory and reports
//! every readiness change through `tracing`. A windowed front end would
//! implement the same port.

use async_trait::async_trait;
use lp_core::onboarding::InitStage;
use lp_core::ports::ReadinessUiPort;
use lp_core::readiness::{InstallLogEntry, LogStream};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiStatus {
    #[default]
    Idle,
    Installing,
    WaitingBackend,
    Success,
    Error(String),
    BackendError(String),
}

#[derive(Default)]
struct UiState {
    status: UiStatus,
    stage: InitStage,
    logs: Vec<InstallLogEntry>,
}

#[derive(Default)]
pub struct LoggingReadinessUi {
    state: Mutex<UiState>,
}

impl LoggingReadinessUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(stage: InitStage) -> Self {
        Self {
            state: Mutex::new(UiState {
                stage,
                ..UiState::default()
            }),
        }
    }

    pub async fn status(&self) -> UiStatus {
        self.state.lock().await.status.clone()
    }

    /// Most recent installer log lines, oldest first.
    pub async fn logs(&self) -> Vec<InstallLogEntry> {
        self.state.lock().await.logs.clone()
    }

    async fn set_status(&self, status: UiStatus) {
        self.state.lock().await.status = status;
    }
}

#[async_trait]
impl ReadinessUiPort for LoggingReadinessUi {
    async fn start_installation(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.status = UiStatus::Installing;
        state.logs.clear();
        info!("installing dependencies");
        Ok(())
    }

    async fn add_log(&self, entry: InstallLogEntry) -> anyhow::Result<()> {
        match entry.kind {
            LogStream::Stdout => info!(target: "launchpad::install", "{}", entry.data),
            LogStream::Stderr => warn!(target: "launchpad::install", "{}", entry.data),
        }

        let mut state = self.state.lock().await;
        if state.logs.len() == MAX_LOG_LINES {
            state.logs.remove(0);
        }
        state.logs.push(entry);
        Ok(())
    }

    async fn set_success(&self) -> anyhow::Result<()> {
        self.set_status(UiStatus::Success).await;
        info!("launchpad ready");
        Ok(())
    }

    async fn set_error(&self, message: &str) -> anyhow::Result<()> {
        self.set_status(UiStatus::Error(message.to_string())).await;
        error!(reason = message, "dependency installation failed");
        Ok(())
    }

    async fn set_backend_error(&self, message: &str) -> anyhow::Result<()> {
        self.set_status(UiStatus::BackendError(message.to_string()))
            .await;
        error!(reason = message, "backend failed to start");
        Ok(())
    }

    async fn set_waiting_backend(&self) -> anyhow::Result<()> {
        self.set_status(UiStatus::WaitingBackend).await;
        info!("waiting for backend");
        Ok(())
    }

    async fn init_stage(&self) -> anyhow::Result<InitStage> {
        Ok(self.state.lock().await.stage)
    }

    async fn set_init_stage(&self, stage: InitStage) -> anyhow::Result<()> {
        self.state.lock().await.stage = stage;
        info!(?stage, "onboarding stage changed");
        Ok(())
    }
}
