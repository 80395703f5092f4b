//! Login restart watcher.
//!
//! After a logout the session layer sets the backend restart marker. When the
//! next user logs in the backend comes back for the new account, so readiness
//! has to wait for it again. The watcher turns the rising edge of
//! "marker set and user present" into one [`ReadinessEvent::RestartAfterLogin`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lp_core::ports::SessionSnapshot;
use lp_core::ReadinessEvent;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::ReadinessInbox;

pub struct LoginRestartWatcher {
    inbox: ReadinessInbox,
    armed: AtomicBool,
}

impl LoginRestartWatcher {
    pub fn new(inbox: ReadinessInbox) -> Self {
        Self {
            inbox,
            armed: AtomicBool::new(false),
        }
    }

    /// Look at a session snapshot; returns `true` when a restart was signalled.
    ///
    /// Fires once per rising edge. The watcher re-arms after the marker is
    /// cleared or the user logs out.
    pub async fn observe(&self, session: &SessionSnapshot) -> bool {
        let due = session.restart_due();
        let was_due = self.armed.swap(due, Ordering::SeqCst);
        if !due || was_due {
            return false;
        }

        info!(user_id = ?session.user_id, "backend restart pending after login");
        self.inbox.notify(ReadinessEvent::RestartAfterLogin).await;
        true
    }

    /// Follow the session change feed until it closes.
    pub fn spawn(self: Arc<Self>, mut session: watch::Receiver<SessionSnapshot>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let current = session.borrow_and_update().clone();
                self.observe(&current).await;
                if session.changed().await.is_err() {
                    debug!("session feed closed, login restart watcher stopped");
                    break;
                }
            }
        })
    }
}
