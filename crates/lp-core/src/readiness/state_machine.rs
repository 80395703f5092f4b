//! Readiness state machine.
//!
//! Defines a pure state transition function for the dual-condition readiness
//! flow. Every branch that mutates a flag ends in [`join_check`].

use serde::{Deserialize, Serialize};

use super::{
    BackendOutcome, InstallOutcome, PollEpisode, PollReason, ReadinessAction, ReadinessEvent,
    ReadinessFlags, ReadinessState,
};

/// Everything the coordinator owns.
///
/// 协调器持有的全部状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessSnapshot {
    pub flags: ReadinessFlags,
    pub state: ReadinessState,
    /// Last port the backend was confirmed on.
    pub backend_port: Option<u16>,
    /// Episode of the polling session currently allowed to promote the backend flag.
    pub active_episode: Option<PollEpisode>,
    next_episode: u64,
}

impl ReadinessSnapshot {
    fn begin_poll(&mut self, reason: PollReason) -> ReadinessAction {
        self.next_episode += 1;
        let episode = PollEpisode::new(self.next_episode);
        self.active_episode = Some(episode);
        ReadinessAction::StartPolling { episode, reason }
    }

    fn end_poll(&mut self, actions: &mut Vec<ReadinessAction>) {
        if let Some(episode) = self.active_episode.take() {
            actions.push(ReadinessAction::CancelPolling { episode });
        }
    }

    /// A confirmed backend clears a previous backend failure.
    fn recover_backend_failure(&mut self) {
        if matches!(self.state, ReadinessState::BackendFailed { .. }) {
            self.state = if self.flags.installation_complete {
                ReadinessState::WaitingBackend
            } else {
                ReadinessState::NotReady
            };
        }
    }
}

/// Promote to [`ReadinessState::Ready`] when both flags hold.
///
/// Emits [`ReadinessAction::ShowSuccess`] only on the transition into `Ready`,
/// so repeated calls are no-ops. Error states are never promoted.
pub fn join_check(snapshot: &mut ReadinessSnapshot, actions: &mut Vec<ReadinessAction>) {
    if snapshot.flags.both_set() && !snapshot.state.is_ready() && !snapshot.state.is_error() {
        snapshot.state = ReadinessState::Ready;
        actions.push(ReadinessAction::ShowSuccess);
    }
}

/// Pure readiness state machine.
///
/// 纯状态机：不包含副作用。
pub struct ReadinessStateMachine;

impl ReadinessStateMachine {
    pub fn transition(
        mut snapshot: ReadinessSnapshot,
        event: ReadinessEvent,
    ) -> (ReadinessSnapshot, Vec<ReadinessAction>) {
        let mut actions = Vec::new();

        match event {
            ReadinessEvent::InstallStarted => {
                snapshot.flags.reset();
                snapshot.state = ReadinessState::Installing;
                actions.push(ReadinessAction::ShowInstalling);
            }
            ReadinessEvent::InstallLog(entry) => {
                actions.push(ReadinessAction::ForwardLog(entry));
            }
            ReadinessEvent::InstallCompleted(outcome) => {
                Self::on_install_completed(&mut snapshot, outcome, &mut actions);
            }
            ReadinessEvent::BackendReported(outcome) => {
                Self::on_backend_reported(&mut snapshot, outcome, &mut actions);
            }
            ReadinessEvent::BackendHealthy { episode, port } => {
                if snapshot.active_episode != Some(episode) || snapshot.flags.backend_ready {
                    // Stale session or already confirmed.
                    return (snapshot, actions);
                }
                snapshot.active_episode = None;
                snapshot.flags.backend_ready = true;
                snapshot.backend_port = Some(port);
                snapshot.recover_backend_failure();
                actions.push(ReadinessAction::ClearRestartMarker);
            }
            ReadinessEvent::PollExpired { episode } => {
                if snapshot.active_episode == Some(episode) {
                    snapshot.active_episode = None;
                }
            }
            ReadinessEvent::ToolsAlreadyInstalled => {
                snapshot.flags.installation_complete = true;
                if !snapshot.flags.backend_ready {
                    if matches!(
                        snapshot.state,
                        ReadinessState::NotReady | ReadinessState::Installing
                    ) {
                        snapshot.state = ReadinessState::WaitingBackend;
                        actions.push(ReadinessAction::ShowWaitingBackend);
                    }
                    actions.push(snapshot.begin_poll(PollReason::AlreadyInstalled));
                }
            }
            ReadinessEvent::InstallationInProgress => {
                if snapshot.state == ReadinessState::NotReady {
                    snapshot.state = ReadinessState::Installing;
                    actions.push(ReadinessAction::ShowInstalling);
                }
            }
            ReadinessEvent::RestartAfterLogin => {
                snapshot.flags.installation_complete = true;
                snapshot.flags.backend_ready = false;
                snapshot.backend_port = None;
                snapshot.state = ReadinessState::WaitingBackend;
                actions.push(ReadinessAction::ShowWaitingBackend);
                actions.push(snapshot.begin_poll(PollReason::LoginRestart));
            }
            ReadinessEvent::PollRequested { reason } => {
                if !snapshot.flags.backend_ready {
                    actions.push(snapshot.begin_poll(reason));
                }
            }
        }

        join_check(&mut snapshot, &mut actions);
        (snapshot, actions)
    }

    fn on_install_completed(
        snapshot: &mut ReadinessSnapshot,
        outcome: InstallOutcome,
        actions: &mut Vec<ReadinessAction>,
    ) {
        if outcome.success {
            snapshot.flags.installation_complete = true;
            // Success is reported by the join-check once the backend is confirmed.
            if !snapshot.flags.backend_ready && !snapshot.state.is_error() {
                snapshot.state = ReadinessState::WaitingBackend;
                actions.push(ReadinessAction::ShowWaitingBackend);
            }
        } else {
            let reason = outcome.failure_reason();
            snapshot.flags.installation_complete = false;
            snapshot.state = ReadinessState::InstallationFailed {
                reason: reason.clone(),
            };
            actions.push(ReadinessAction::ShowInstallationError { reason });
        }
    }

    fn on_backend_reported(
        snapshot: &mut ReadinessSnapshot,
        outcome: BackendOutcome,
        actions: &mut Vec<ReadinessAction>,
    ) {
        if outcome.success {
            if outcome.port.is_some() {
                snapshot.backend_port = outcome.port;
            }
            if snapshot.flags.backend_ready {
                return;
            }
            snapshot.flags.backend_ready = true;
            snapshot.recover_backend_failure();
            snapshot.end_poll(actions);
            actions.push(ReadinessAction::ClearRestartMarker);
        } else {
            let reason = outcome.failure_reason();
            // A running poll session stays active and may still confirm the backend.
            snapshot.flags.backend_ready = false;
            if matches!(snapshot.state, ReadinessState::InstallationFailed { .. }) {
                // Installation failure stays the surfaced error for this cycle.
                return;
            }
            snapshot.state = ReadinessState::BackendFailed {
                reason: reason.clone(),
            };
            actions.push(ReadinessAction::ShowBackendError { reason });
        }
    }
}
