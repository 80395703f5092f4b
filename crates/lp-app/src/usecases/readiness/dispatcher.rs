//! Single-consumer event loop for the readiness coordinator.
//!
//! Every readiness event (installer notifications, poller results,
//! reconciliation and login signals) goes through one bounded channel. The
//! dispatcher drains it one event at a time, so a transition and its
//! join-check always complete before the next event is looked at.

use std::sync::Arc;

use lp_core::ReadinessEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{ReadinessCoordinator, ReadinessError};

/// Cloneable sending half of the readiness channel.
#[derive(Clone)]
pub struct ReadinessInbox {
    tx: mpsc::Sender<ReadinessEvent>,
}

impl ReadinessInbox {
    pub async fn send(&self, event: ReadinessEvent) -> Result<(), ReadinessError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| ReadinessError::InboxClosed)
    }

    /// Send, logging instead of failing when the dispatcher is gone.
    pub async fn notify(&self, event: ReadinessEvent) {
        let kind = event.kind();
        if self.send(event).await.is_err() {
            debug!(event = kind, "readiness inbox closed, dropping event");
        }
    }
}

/// Create the readiness channel.
pub fn readiness_channel(capacity: usize) -> (ReadinessInbox, mpsc::Receiver<ReadinessEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ReadinessInbox { tx }, rx)
}

pub struct ReadinessDispatcher;

impl ReadinessDispatcher {
    pub fn spawn(
        coordinator: Arc<ReadinessCoordinator>,
        mut events: mpsc::Receiver<ReadinessEvent>,
    ) -> DispatcherHandle {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                coordinator.dispatch(event).await;
            }
            info!("readiness dispatcher stopped");
        });
        DispatcherHandle { task: Some(task) }
    }
}

/// Owns the dispatcher task; dropping it stops the loop.
pub struct DispatcherHandle {
    task: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
