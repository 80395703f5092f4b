/// Errors produced by the readiness use cases.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("readiness inbox closed")]
    InboxClosed,
    #[error("installer failed: {0}")]
    Installer(#[source] anyhow::Error),
}
