//! File-based session state store
//!
//! Persists the logged-in user and the pending backend restart marker to a
//! JSON file and publishes every change on a watch channel.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lp_core::ports::{SessionSnapshot, SessionStatePort};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

pub const DEFAULT_SESSION_FILE: &str = "session.json";

pub struct FileSessionStore {
    path: PathBuf,
    state: Mutex<SessionSnapshot>,
    tx: watch::Sender<SessionSnapshot>,
}

impl FileSessionStore {
    /// Load the store from `path`. A missing or empty file starts logged out.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let snapshot = read_snapshot(&path).await?;
        let (tx, _) = watch::channel(snapshot.clone());

        Ok(Self {
            path,
            state: Mutex::new(snapshot),
            tx,
        })
    }

    /// Create the store in `base_dir` with the default file name.
    pub async fn with_defaults(base_dir: &Path) -> anyhow::Result<Self> {
        Self::open(base_dir.join(DEFAULT_SESSION_FILE)).await
    }

    pub async fn login(&self, user_id: impl Into<String>) -> anyhow::Result<()> {
        let user_id = user_id.into();
        info!(%user_id, "session login");
        self.update(|s| s.user_id = Some(user_id)).await
    }

    /// Log out; the backend must restart before the next account can use it.
    pub async fn logout(&self) -> anyhow::Result<()> {
        info!("session logout, backend restart pending");
        self.update(|s| {
            s.user_id = None;
            s.needs_backend_restart = true;
        })
        .await
    }

    async fn update(&self, apply: impl FnOnce(&mut SessionSnapshot)) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        apply(&mut next);
        if next == *state {
            return Ok(());
        }

        write_snapshot(&self.path, &next).await?;
        *state = next.clone();
        self.tx.send_replace(next);
        Ok(())
    }
}

#[async_trait]
impl SessionStatePort for FileSessionStore {
    async fn snapshot(&self) -> anyhow::Result<SessionSnapshot> {
        Ok(self.state.lock().await.clone())
    }

    async fn clear_needs_backend_restart(&self) -> anyhow::Result<()> {
        debug!("clearing backend restart marker");
        self.update(|s| s.needs_backend_restart = false).await
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

async fn read_snapshot(path: &Path) -> anyhow::Result<SessionSnapshot> {
    if !path.exists() {
        return Ok(SessionSnapshot::default());
    }

    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(SessionSnapshot::default());
    }

    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse session state: {e}"))
}

async fn write_snapshot(path: &Path, snapshot: &SessionSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| anyhow::anyhow!("Failed to serialize session state: {e}"))?;

    let mut file = fs::File::create(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create session file: {e}"))?;
    file.write_all(json.as_bytes())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write session file: {e}"))?;
    file.sync_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to sync session file: {e}"))?;

    Ok(())
}
