//! Process-backed installer
//!
//! Runs the configured install command (for example `uv sync`), streams its
//! output line by line as install-log notifications and records success in a
//! marker file so later launches can skip the installation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lp_core::config::InstallerConfig;
use lp_core::ports::{
    InstallationStatus, InstallerEvent, InstallerEventSource, InstallerPort, ToolInstallStatus,
};
use lp_core::readiness::{BackendOutcome, InstallOutcome, LogStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

pub const DEFAULT_MARKER_FILE: &str = ".deps_installed";
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum InstallerError {
    #[error("installation already running")]
    AlreadyRunning,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for installer: {0}")]
    Wait(#[source] std::io::Error),
    #[error("{0}")]
    Exited(String),
    #[error("failed to write install marker {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct ProcessInstaller {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    marker_file: PathBuf,
    events: broadcast::Sender<InstallerEvent>,
    running: AtomicBool,
}

impl ProcessInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>, marker_file: PathBuf) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            program: program.into(),
            args,
            working_dir: None,
            marker_file,
            events,
            running: AtomicBool::new(false),
        }
    }

    /// Build from config; `default_marker` is used when no marker file is configured.
    pub fn from_config(config: &InstallerConfig, default_marker: PathBuf) -> Self {
        let marker = config.marker_file.clone().unwrap_or(default_marker);
        let installer = Self::new(config.program.clone(), config.args.clone(), marker);
        match &config.working_dir {
            Some(dir) => installer.with_working_dir(dir),
            None => installer,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn marker_file(&self) -> &Path {
        &self.marker_file
    }

    /// Publish a backend startup result on the installer event stream.
    pub fn report_backend(&self, outcome: BackendOutcome) {
        self.publish(InstallerEvent::BackendReady(outcome));
    }

    fn publish(&self, event: InstallerEvent) {
        // No receivers just means nobody is mounted yet.
        let _ = self.events.send(event);
    }

    async fn run(&self) -> Result<(), InstallerError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| InstallerError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let readers = [
            child
                .stdout
                .take()
                .map(|out| self.forward_lines(out, LogStream::Stdout)),
            child
                .stderr
                .take()
                .map(|err| self.forward_lines(err, LogStream::Stderr)),
        ];

        let status = child.wait().await.map_err(InstallerError::Wait)?;
        for reader in readers.into_iter().flatten() {
            if let Err(err) = reader.await {
                warn!(error = %err, "installer output reader failed");
            }
        }

        if !status.success() {
            let outcome = InstallOutcome {
                success: false,
                code: status.code(),
                error: None,
            };
            return Err(InstallerError::Exited(outcome.failure_reason()));
        }

        if let Some(parent) = self.marker_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| InstallerError::Marker {
                    path: self.marker_file.clone(),
                    source,
                })?;
        }
        tokio::fs::write(&self.marker_file, chrono::Utc::now().to_rfc3339())
            .await
            .map_err(|source| InstallerError::Marker {
                path: self.marker_file.clone(),
                source,
            })?;
        Ok(())
    }

    fn forward_lines<R>(&self, stream: R, kind: LogStream) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(data)) => {
                        let _ = events.send(InstallerEvent::InstallLog { kind, data });
                    }
                    Ok(None) => break,
                    Err(err) => {
                        debug!(?kind, error = %err, "installer output closed");
                        break;
                    }
                }
            }
        })
    }
}

/// Clears the running flag on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl InstallerPort for ProcessInstaller {
    async fn check_tool_installed(&self) -> anyhow::Result<ToolInstallStatus> {
        let is_installed = tokio::fs::try_exists(&self.marker_file).await?;
        Ok(ToolInstallStatus {
            success: true,
            is_installed,
        })
    }

    async fn installation_status(&self) -> anyhow::Result<InstallationStatus> {
        Ok(InstallationStatus {
            success: true,
            is_installing: self.running.load(Ordering::SeqCst),
        })
    }

    async fn perform_installation(&self) -> anyhow::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(InstallerError::AlreadyRunning.into());
        }
        let _running = RunningGuard(&self.running);

        let span = info_span!("infra.installer.run", program = %self.program);
        async {
            info!(args = ?self.args, "installation started");
            self.publish(InstallerEvent::InstallStarted);

            match self.run().await {
                Ok(()) => {
                    info!("installation finished");
                    self.publish(InstallerEvent::InstallCompleted(InstallOutcome::succeeded()));
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "installation failed");
                    self.publish(InstallerEvent::InstallCompleted(InstallOutcome::failed(
                        err.to_string(),
                    )));
                    Err(anyhow::Error::from(err))
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl InstallerEventSource for ProcessInstaller {
    fn subscribe(&self) -> broadcast::Receiver<InstallerEvent> {
        self.events.subscribe()
    }
}
