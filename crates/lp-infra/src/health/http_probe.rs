//! HTTP health probe for the local backend.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lp_core::config::{BackendConfig, PollerConfig};
use lp_core::ports::{HealthProbeError, HealthProbePort};
use tracing::trace;

/// Probes `http://{host}:{port}{health_path}` with a per-request timeout.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    host: String,
    health_path: String,
}

impl HttpHealthProbe {
    pub fn new(
        host: impl Into<String>,
        health_path: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build health probe HTTP client")?;
        let health_path = health_path.into();
        let health_path = if health_path.starts_with('/') {
            health_path
        } else {
            format!("/{health_path}")
        };

        Ok(Self {
            client,
            host: host.into(),
            health_path,
        })
    }

    pub fn from_config(backend: &BackendConfig, poller: &PollerConfig) -> anyhow::Result<Self> {
        Self::new(
            backend.host.clone(),
            backend.health_path.clone(),
            poller.probe_timeout(),
        )
    }

    pub fn health_url(&self, port: u16) -> String {
        format!("http://{}:{}{}", self.host, port, self.health_path)
    }
}

#[async_trait]
impl HealthProbePort for HttpHealthProbe {
    async fn probe(&self, port: u16) -> Result<(), HealthProbeError> {
        let url = self.health_url(port);
        trace!(%url, "probing backend health");

        let response = self.client.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                HealthProbeError::Timeout
            } else {
                HealthProbeError::Unreachable(err.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(HealthProbeError::Status(status.as_u16()))
        }
    }
}
