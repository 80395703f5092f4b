//! Business logic use cases
//!
//! installer / backend notifications ──► EventIngress ─┐
//! mount reconciliation ───────────────────────────────┤
//! login restart watcher ──────────────────────────────┼─► inbox ─► dispatcher ─► coordinator
//! backend health poller ──────────────────────────────┘

pub mod install;
pub mod readiness;

pub use install::PerformInstallation;
pub use readiness::{
    BackendHealthPoller, EventIngress, ListenerGuard, LoginRestartWatcher, MountReconciliation,
    PollStart, ReadinessCoordinator, ReadinessDispatcher,
    ReadinessError, ReadinessInbox, ReadinessMount, ReadinessMountDeps, ReconcileReport,
};
