//! Readiness coordination use cases.

mod coordinator;
mod dispatcher;
mod error;
mod ingress;
mod login_restart;
mod mount;
mod poller;
mod reconcile;

pub use coordinator::ReadinessCoordinator;
pub use dispatcher::{readiness_channel, DispatcherHandle, ReadinessDispatcher, ReadinessInbox};
pub use error::ReadinessError;
pub use ingress::{EventIngress, ListenerGuard};
pub use login_restart::LoginRestartWatcher;
pub use mount::{ReadinessMount, ReadinessMountDeps};
pub use poller::{BackendHealthPoller, PollStart};
pub use reconcile::{MountReconciliation, ReconcileReport};

/// Capacity of the readiness inbox.
pub const READINESS_INBOX_CAPACITY: usize = 64;
