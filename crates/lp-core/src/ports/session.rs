//! Session state port
//!
//! Session management owns the pending backend restart marker; the readiness
//! coordinator reads it and clears it once the backend is confirmed again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Identity of the logged-in user, if any.
    pub user_id: Option<String>,
    /// Set on logout; the backend must restart for the next account.
    pub needs_backend_restart: bool,
}

impl SessionSnapshot {
    /// Marker set and a user present: the backend must be restarted now.
    pub fn restart_due(&self) -> bool {
        self.needs_backend_restart && self.user_id.is_some()
    }
}

#[async_trait]
pub trait SessionStatePort: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<SessionSnapshot>;

    async fn clear_needs_backend_restart(&self) -> anyhow::Result<()>;

    /// Change feed of the session snapshot.
    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;
}
