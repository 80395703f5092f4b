//! # Configuration Loader / 配置加载器
//!
//! Reads the readiness configuration from a TOML file. Missing sections and
//! keys fall back to the model defaults; the loader itself adds no rules.

use std::path::{Path, PathBuf};

use anyhow::Context;
use lp_core::ReadinessConfig;
use tracing::info;

use super::AppPaths;

pub const CONFIG_PATH_ENV: &str = "LAUNCHPAD_CONFIG";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML for the model.
pub fn load_config(config_path: &Path) -> anyhow::Result<ReadinessConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content).context("Failed to parse config as TOML")
}

/// Load configuration, using defaults when the file does not exist.
pub fn load_config_or_default(config_path: &Path) -> anyhow::Result<ReadinessConfig> {
    if !config_path.exists() {
        info!(path = %config_path.display(), "config file not found, using defaults");
        return Ok(ReadinessConfig::default());
    }
    load_config(config_path)
}

/// `LAUNCHPAD_CONFIG` if set, otherwise the config file in the app data dir.
pub fn resolve_config_path(paths: &AppPaths) -> PathBuf {
    config_path_from(std::env::var(CONFIG_PATH_ENV).ok(), paths)
}

fn config_path_from(env_value: Option<String>, paths: &AppPaths) -> PathBuf {
    match env_value {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => paths.config_file.clone(),
    }
}
