//! Application directories.

use std::path::{Path, PathBuf};

use anyhow::Context;
use lp_infra::installer::DEFAULT_MARKER_FILE;
use lp_infra::session::DEFAULT_SESSION_FILE;

const APP_DIR_NAME: &str = "launchpad";

fn resolved_app_dir_name() -> String {
    match std::env::var("LAUNCHPAD_PROFILE") {
        Ok(profile) if !profile.is_empty() => format!("{APP_DIR_NAME}-{profile}"),
        _ => APP_DIR_NAME.to_string(),
    }
}

/// Well-known files and directories under the app's local data dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
    pub session_file: PathBuf,
    pub install_marker: PathBuf,
    pub backend_port_file: PathBuf,
}

impl AppPaths {
    /// Resolve from the system local data dir, honoring `LAUNCHPAD_PROFILE`.
    pub fn resolve() -> anyhow::Result<Self> {
        let base = dirs::data_local_dir().context("local data directory is unavailable")?;
        Ok(Self::from_data_dir(base.join(resolved_app_dir_name())))
    }

    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            logs_dir: data_dir.join("logs"),
            config_file: data_dir.join("launchpad.toml"),
            session_file: data_dir.join(DEFAULT_SESSION_FILE),
            install_marker: data_dir.join(DEFAULT_MARKER_FILE),
            backend_port_file: data_dir.join("backend.port"),
            data_dir,
        }
    }
}
