use serde::{Deserialize, Serialize};

/// Readiness state exposed to the UI layer.
///
/// 暴露给 UI 层的就绪状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReadinessState {
    /// Nothing known yet.
    ///
    /// 尚未就绪。
    #[default]
    NotReady,
    /// Dependency installation is running.
    ///
    /// 正在安装依赖。
    Installing,
    /// Installation satisfied, backend not yet confirmed.
    ///
    /// 安装完成，等待后端。
    WaitingBackend,
    /// Both conditions hold.
    ///
    /// 已就绪。
    Ready,
    /// Installation failed. Terminal for the current cycle.
    ///
    /// 安装失败。
    InstallationFailed { reason: String },
    /// Backend reported a startup failure.
    ///
    /// 后端启动失败。
    BackendFailed { reason: String },
}

/// Coarse three-valued view of [`ReadinessState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeReadiness {
    NotReady,
    Ready,
    Error,
}

impl ReadinessState {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ReadinessState::InstallationFailed { .. } | ReadinessState::BackendFailed { .. }
        )
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }

    pub fn composite(&self) -> CompositeReadiness {
        match self {
            ReadinessState::Ready => CompositeReadiness::Ready,
            state if state.is_error() => CompositeReadiness::Error,
            _ => CompositeReadiness::NotReady,
        }
    }
}
