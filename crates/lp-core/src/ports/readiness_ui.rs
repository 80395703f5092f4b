use async_trait::async_trait;

use crate::onboarding::InitStage;
use crate::readiness::InstallLogEntry;

/// UI-side store the coordinator reports readiness into.
#[async_trait]
pub trait ReadinessUiPort: Send + Sync {
    async fn start_installation(&self) -> anyhow::Result<()>;

    async fn add_log(&self, entry: InstallLogEntry) -> anyhow::Result<()>;

    async fn set_success(&self) -> anyhow::Result<()>;

    async fn set_error(&self, message: &str) -> anyhow::Result<()>;

    async fn set_backend_error(&self, message: &str) -> anyhow::Result<()>;

    async fn set_waiting_backend(&self) -> anyhow::Result<()>;

    async fn init_stage(&self) -> anyhow::Result<InitStage>;

    async fn set_init_stage(&self, stage: InitStage) -> anyhow::Result<()>;
}
