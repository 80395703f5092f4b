//! Readiness configuration domain model

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_POLL_CEILING_SECS: u64 = 30;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_500;

/// Readiness configuration
///
/// Every section falls back to its defaults when absent from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub poller: PollerConfig,
    pub backend: BackendConfig,
    pub installer: InstallerConfig,
    pub session: SessionConfig,
}

/// Backend health polling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between interval probes.
    pub interval_secs: u64,
    /// Hard ceiling for one polling session, measured from its start.
    pub ceiling_secs: u64,
    /// Per-probe request timeout.
    pub probe_timeout_ms: u64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_secs(self.ceiling_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            ceiling_secs: DEFAULT_POLL_CEILING_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

/// Where to find the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub health_path: String,
    /// Fixed port. Takes precedence over `port_file`.
    pub port: Option<u16>,
    /// File the backend writes its listening port to.
    pub port_file: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            health_path: "/health".to_string(),
            port: None,
            port_file: None,
        }
    }
}

/// Dependency installer command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Directory the command runs in. Defaults to the launcher's own.
    pub working_dir: Option<PathBuf>,
    /// Written after a successful install; its presence means "installed".
    pub marker_file: Option<PathBuf>,
    /// Run the installer on startup when the tools are missing.
    pub auto_install: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            program: "uv".to_string(),
            args: vec!["sync".to_string()],
            working_dir: None,
            marker_file: None,
            auto_install: true,
        }
    }
}

/// Session persistence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub state_file: Option<PathBuf>,
}
