use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lp_core::config::BackendConfig;
use lp_core::ports::BackendLocatorPort;
use tokio::fs;

/// Backend listening on a port known up front.
pub struct StaticBackendLocator {
    port: u16,
}

impl StaticBackendLocator {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl BackendLocatorPort for StaticBackendLocator {
    async fn backend_port(&self) -> anyhow::Result<Option<u16>> {
        Ok(Some(self.port))
    }
}

/// Backend that publishes its port in a file once it is listening.
///
/// A missing or empty file means the backend has not published a port yet.
pub struct PortFileLocator {
    path: PathBuf,
}

impl PortFileLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl BackendLocatorPort for PortFileLocator {
    async fn backend_port(&self) -> anyhow::Result<Option<u16>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read port file {}", self.path.display())
                })
            }
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let port = trimmed
            .parse::<u16>()
            .with_context(|| format!("Invalid port in {}: {trimmed:?}", self.path.display()))?;
        Ok(Some(port))
    }
}

/// Pick the locator for the configured backend: a fixed port wins over a port file.
pub fn locator_from_config(
    config: &BackendConfig,
    default_port_file: PathBuf,
) -> Arc<dyn BackendLocatorPort> {
    match (config.port, &config.port_file) {
        (Some(port), _) => Arc::new(StaticBackendLocator::new(port)),
        (None, Some(path)) => Arc::new(PortFileLocator::new(path.clone())),
        (None, None) => Arc::new(PortFileLocator::new(default_port_file)),
    }
}
