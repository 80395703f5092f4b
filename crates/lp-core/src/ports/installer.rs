//! Installer subsystem port
//!
//! The installer installs local dependencies and reports progress through an
//! event stream. The readiness coordinator only queries it and listens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::readiness::{BackendOutcome, InstallOutcome, LogStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInstallStatus {
    pub success: bool,
    pub is_installed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationStatus {
    pub success: bool,
    pub is_installing: bool,
}

/// Notifications published by the installer/backend subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InstallerEvent {
    #[serde(rename = "install-dependencies-start")]
    InstallStarted,
    #[serde(rename = "install-dependencies-log")]
    InstallLog { kind: LogStream, data: String },
    #[serde(rename = "install-dependencies-complete")]
    InstallCompleted(InstallOutcome),
    #[serde(rename = "backend-ready")]
    BackendReady(BackendOutcome),
}

#[async_trait]
pub trait InstallerPort: Send + Sync {
    /// Are the local tools already installed?
    async fn check_tool_installed(&self) -> anyhow::Result<ToolInstallStatus>;

    /// Is an installation running right now (possibly started by a previous process)?
    async fn installation_status(&self) -> anyhow::Result<InstallationStatus>;

    /// Run the installation. Progress is reported through [`InstallerEventSource`].
    async fn perform_installation(&self) -> anyhow::Result<()>;
}

/// Event stream of the installer subsystem.
pub trait InstallerEventSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<InstallerEvent>;
}
