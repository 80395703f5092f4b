use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HealthProbeError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("health probe timed out")]
    Timeout,

    #[error("health endpoint returned status {0}")]
    Status(u16),
}
