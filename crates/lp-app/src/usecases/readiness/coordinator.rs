//! Readiness coordinator.
//!
//! Owns the readiness flags for one application session, drives the pure
//! [`ReadinessStateMachine`] and executes the actions it returns.

use std::sync::Arc;

use lp_core::ports::{ReadinessUiPort, SessionStatePort};
use lp_core::{
    PollReason, ReadinessAction, ReadinessEvent, ReadinessSnapshot, ReadinessState,
    ReadinessStateMachine,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};

use super::BackendHealthPoller;

pub struct ReadinessCoordinator {
    snapshot: Mutex<ReadinessSnapshot>,
    state_tx: watch::Sender<ReadinessState>,
    poller: Arc<BackendHealthPoller>,
    ui: Arc<dyn ReadinessUiPort>,
    session: Arc<dyn SessionStatePort>,
}

impl ReadinessCoordinator {
    pub fn new(
        poller: Arc<BackendHealthPoller>,
        ui: Arc<dyn ReadinessUiPort>,
        session: Arc<dyn SessionStatePort>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::default());
        Self {
            snapshot: Mutex::new(ReadinessSnapshot::default()),
            state_tx,
            poller,
            ui,
            session,
        }
    }

    /// Apply one event: transition, join-check, then side effects.
    ///
    /// Concurrent callers are serialized; the next event sees the fully
    /// applied result of the previous one.
    pub async fn dispatch(&self, event: ReadinessEvent) -> ReadinessSnapshot {
        let span = info_span!("usecase.readiness.dispatch", event = event.kind());
        async {
            let mut guard = self.snapshot.lock().await;
            let from = guard.state.clone();
            let (next, actions) = ReadinessStateMachine::transition(guard.clone(), event);
            if from != next.state {
                info!(from = ?from, to = ?next.state, "readiness state transition");
                self.state_tx.send_replace(next.state.clone());
            }
            *guard = next.clone();

            // Keep the guard while executing so side effects stay ordered with transitions.
            self.execute_actions(actions).await;
            drop(guard);
            next
        }
        .instrument(span)
        .await
    }

    /// Request a polling session; a running one is superseded.
    pub async fn start_polling(&self, reason: PollReason) -> ReadinessSnapshot {
        self.dispatch(ReadinessEvent::PollRequested { reason }).await
    }

    pub async fn snapshot(&self) -> ReadinessSnapshot {
        self.snapshot.lock().await.clone()
    }

    pub fn state(&self) -> ReadinessState {
        self.state_tx.borrow().clone()
    }

    /// Change feed of the readiness state.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    pub fn poller(&self) -> &Arc<BackendHealthPoller> {
        &self.poller
    }

    /// Stop background polling. Called on teardown.
    pub fn shutdown(&self) {
        self.poller.cancel_all();
    }

    async fn execute_actions(&self, actions: Vec<ReadinessAction>) {
        for action in actions {
            debug!(?action, "readiness executing action");
            let result = match &action {
                ReadinessAction::ShowInstalling => self.ui.start_installation().await,
                ReadinessAction::ForwardLog(entry) => self.ui.add_log(entry.clone()).await,
                ReadinessAction::ShowWaitingBackend => self.ui.set_waiting_backend().await,
                ReadinessAction::ShowSuccess => self.ui.set_success().await,
                ReadinessAction::ShowInstallationError { reason } => {
                    self.ui.set_error(reason).await
                }
                ReadinessAction::ShowBackendError { reason } => {
                    self.ui.set_backend_error(reason).await
                }
                ReadinessAction::StartPolling { episode, reason } => {
                    self.poller.spawn(*episode, *reason);
                    Ok(())
                }
                ReadinessAction::CancelPolling { episode } => {
                    self.poller.cancel(*episode);
                    Ok(())
                }
                ReadinessAction::ClearRestartMarker => {
                    self.session.clear_needs_backend_restart().await
                }
            };

            if let Err(err) = result {
                warn!(?action, error = %err, "readiness action failed");
            }
        }
    }
}
