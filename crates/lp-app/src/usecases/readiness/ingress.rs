//! Event ingress from the installer/backend subsystem.
//!
//! The four installer notifications (start, log, complete, backend-ready) are
//! attached together as one listener and released together when the returned
//! [`ListenerGuard`] is dropped.

use std::sync::Arc;

use lp_core::ports::{ClockPort, InstallerEvent, InstallerEventSource};
use lp_core::readiness::InstallLogEntry;
use lp_core::ReadinessEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ReadinessInbox;

pub struct EventIngress {
    inbox: ReadinessInbox,
    clock: Arc<dyn ClockPort>,
}

impl EventIngress {
    pub fn new(inbox: ReadinessInbox, clock: Arc<dyn ClockPort>) -> Self {
        Self { inbox, clock }
    }

    /// Start forwarding installer notifications into the readiness inbox.
    pub fn attach(&self, source: &dyn InstallerEventSource) -> ListenerGuard {
        let mut events = source.subscribe();
        let inbox = self.inbox.clone();
        let clock = Arc::clone(&self.clock);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let event = translate(event, clock.now_ms());
                        if inbox.send(event).await.is_err() {
                            debug!("readiness inbox closed, detaching installer listener");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "installer listener lagged, notifications dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("installer event stream closed");
                        break;
                    }
                }
            }
        });
        debug!("installer listeners attached");

        ListenerGuard { task: Some(task) }
    }
}

/// Map an installer notification to a readiness event.
///
/// Log lines are stamped with their arrival time.
pub fn translate(event: InstallerEvent, now_ms: i64) -> ReadinessEvent {
    match event {
        InstallerEvent::InstallStarted => ReadinessEvent::InstallStarted,
        InstallerEvent::InstallLog { kind, data } => {
            ReadinessEvent::InstallLog(InstallLogEntry::at_millis(kind, data, now_ms))
        }
        InstallerEvent::InstallCompleted(outcome) => ReadinessEvent::InstallCompleted(outcome),
        InstallerEvent::BackendReady(outcome) => ReadinessEvent::BackendReported(outcome),
    }
}

/// Attached installer listeners. Dropping the guard detaches them.
pub struct ListenerGuard {
    task: Option<JoinHandle<()>>,
}

impl ListenerGuard {
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("installer listeners detached");
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}
