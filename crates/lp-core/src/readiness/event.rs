use serde::{Deserialize, Serialize};

use super::{InstallLogEntry, PollEpisode, PollReason};

/// Result carried by an install-complete notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub error: Option<String>,
}

impl InstallOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: None,
            error: Some(error.into()),
        }
    }

    /// Human readable failure reason; prefers the explicit error text.
    pub fn failure_reason(&self) -> String {
        match (&self.error, self.code) {
            (Some(error), _) if !error.is_empty() => error.clone(),
            (_, Some(code)) => format!("installation exited with code {code}"),
            _ => "installation failed".to_string(),
        }
    }
}

/// Result carried by a backend-ready notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOutcome {
    pub success: bool,
    pub port: Option<u16>,
    pub error: Option<String>,
}

impl BackendOutcome {
    pub fn started(port: u16) -> Self {
        Self {
            success: true,
            port: Some(port),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            port: None,
            error: Some(error.into()),
        }
    }

    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(error) if !error.is_empty() => error.clone(),
            _ => "backend failed to start".to_string(),
        }
    }
}

/// Inbound messages handled by the readiness state machine.
///
/// 驱动就绪状态机的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessEvent {
    /// A fresh installation cycle started.
    ///
    /// 开始新的安装周期。
    InstallStarted,
    /// Installer log line; no state effect.
    ///
    /// 安装日志，不影响状态。
    InstallLog(InstallLogEntry),
    /// Installer finished.
    ///
    /// 安装结束。
    InstallCompleted(InstallOutcome),
    /// Backend subsystem pushed its startup result.
    ///
    /// 后端推送的启动结果。
    BackendReported(BackendOutcome),
    /// A polling session confirmed the backend is live.
    ///
    /// 轮询确认后端存活。
    BackendHealthy { episode: PollEpisode, port: u16 },
    /// A polling session hit its ceiling without success.
    ///
    /// 轮询超时。
    PollExpired { episode: PollEpisode },
    /// Mount reconciliation found the tools already installed.
    ///
    /// 挂载时发现工具已安装。
    ToolsAlreadyInstalled,
    /// Mount reconciliation found an installation running externally.
    ///
    /// 挂载时发现安装正在进行。
    InstallationInProgress,
    /// A user logged in while a backend restart was pending.
    ///
    /// 登录后需要重启后端。
    RestartAfterLogin,
    /// Explicit request to (re)start backend polling.
    ///
    /// 显式请求轮询后端。
    PollRequested { reason: PollReason },
}

impl ReadinessEvent {
    /// Short name used as a span field.
    pub fn kind(&self) -> &'static str {
        match self {
            ReadinessEvent::InstallStarted => "install_started",
            ReadinessEvent::InstallLog(_) => "install_log",
            ReadinessEvent::InstallCompleted(_) => "install_completed",
            ReadinessEvent::BackendReported(_) => "backend_reported",
            ReadinessEvent::BackendHealthy { .. } => "backend_healthy",
            ReadinessEvent::PollExpired { .. } => "poll_expired",
            ReadinessEvent::ToolsAlreadyInstalled => "tools_already_installed",
            ReadinessEvent::InstallationInProgress => "installation_in_progress",
            ReadinessEvent::RestartAfterLogin => "restart_after_login",
            ReadinessEvent::PollRequested { .. } => "poll_requested",
        }
    }
}
