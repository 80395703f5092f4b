use super::{InstallLogEntry, PollEpisode, PollReason};

/// Side-effects produced by readiness transitions.
///
/// 状态迁移产生的副作用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessAction {
    /// Tell the UI an installation is running.
    ShowInstalling,
    /// Forward an installer log line to the log sink.
    ForwardLog(InstallLogEntry),
    /// Tell the UI installation is satisfied and the backend is awaited.
    ShowWaitingBackend,
    /// Tell the UI the application is ready. Emitted exactly once per cycle.
    ShowSuccess,
    /// Surface an installation failure.
    ShowInstallationError { reason: String },
    /// Surface a backend startup failure.
    ShowBackendError { reason: String },
    /// Start a polling session, superseding any active one.
    StartPolling {
        episode: PollEpisode,
        reason: PollReason,
    },
    /// Cancel the polling session with this episode if still active.
    CancelPolling { episode: PollEpisode },
    /// Clear the session's pending backend restart marker.
    ClearRestartMarker,
}
