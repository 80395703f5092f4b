use async_trait::async_trait;

use super::HealthProbeError;

/// Resolves the port the backend is currently listening on.
#[async_trait]
pub trait BackendLocatorPort: Send + Sync {
    /// `Ok(None)` means the backend has not published an address yet.
    async fn backend_port(&self) -> anyhow::Result<Option<u16>>;
}

/// Probes the backend health endpoint on a given port.
#[async_trait]
pub trait HealthProbePort: Send + Sync {
    async fn probe(&self, port: u16) -> Result<(), HealthProbeError>;
}
