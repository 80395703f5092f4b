//! Readiness mount lifecycle.
//!
//! 每个应用会话构造一个 `ReadinessMount`，负责：
//! - 构造 inbox、poller、coordinator 并启动 dispatcher
//! - mount 时挂载安装器监听、执行一次性对账、启动登录重启监听
//! - teardown 时释放所有监听并停止轮询
//!
//! One instance exists per application session. Mounting twice has the same
//! effect as mounting once; tearing down releases every listener so a later
//! mount does not handle events twice.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lp_core::config::PollerConfig;
use lp_core::ports::{
    BackendLocatorPort, ClockPort, HealthProbePort, InstallerEventSource, InstallerPort,
    ReadinessUiPort, SessionStatePort,
};
use lp_core::{PollReason, ReadinessSnapshot, ReadinessState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{
    readiness_channel, BackendHealthPoller, DispatcherHandle, EventIngress, ListenerGuard,
    LoginRestartWatcher, MountReconciliation, ReadinessCoordinator, ReadinessDispatcher,
    ReconcileReport, READINESS_INBOX_CAPACITY,
};

/// Helper for constructing the mount with explicit dependency fields.
pub struct ReadinessMountDeps {
    pub installer: Arc<dyn InstallerPort>,
    pub installer_events: Arc<dyn InstallerEventSource>,
    pub locator: Arc<dyn BackendLocatorPort>,
    pub probe: Arc<dyn HealthProbePort>,
    pub ui: Arc<dyn ReadinessUiPort>,
    pub session: Arc<dyn SessionStatePort>,
    pub clock: Arc<dyn ClockPort>,
    pub poller: PollerConfig,
}

struct Attached {
    listeners: ListenerGuard,
    login_watcher: JoinHandle<()>,
}

pub struct ReadinessMount {
    coordinator: Arc<ReadinessCoordinator>,
    ingress: EventIngress,
    reconciliation: MountReconciliation,
    login_watcher: Arc<LoginRestartWatcher>,
    installer_events: Arc<dyn InstallerEventSource>,
    session: Arc<dyn SessionStatePort>,
    attached: Mutex<Option<Attached>>,
    dispatcher: Mutex<DispatcherHandle>,
}

impl ReadinessMount {
    /// Build the coordinator and start its dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(deps: ReadinessMountDeps) -> Self {
        let ReadinessMountDeps {
            installer,
            installer_events,
            locator,
            probe,
            ui,
            session,
            clock,
            poller,
        } = deps;

        let (inbox, events) = readiness_channel(READINESS_INBOX_CAPACITY);
        let poller = Arc::new(BackendHealthPoller::new(
            locator,
            probe,
            poller,
            inbox.clone(),
        ));
        let coordinator = Arc::new(ReadinessCoordinator::new(
            poller,
            Arc::clone(&ui),
            Arc::clone(&session),
        ));
        let dispatcher = ReadinessDispatcher::spawn(Arc::clone(&coordinator), events);

        Self {
            ingress: EventIngress::new(inbox.clone(), clock),
            reconciliation: MountReconciliation::new(installer, ui, inbox.clone()),
            login_watcher: Arc::new(LoginRestartWatcher::new(inbox)),
            coordinator,
            installer_events,
            session,
            attached: Mutex::new(None),
            dispatcher: Mutex::new(dispatcher),
        }
    }

    /// Attach listeners and reconcile with the installer.
    ///
    /// Listeners are attached at most once until [`teardown`](Self::teardown).
    /// Reconciliation runs once per instance regardless of teardown.
    pub async fn mount(&self) -> ReconcileReport {
        {
            let mut attached = self.lock_attached();
            if attached.is_none() {
                let listeners = self.ingress.attach(self.installer_events.as_ref());
                let login_watcher =
                    Arc::clone(&self.login_watcher).spawn(self.session.subscribe());
                *attached = Some(Attached {
                    listeners,
                    login_watcher,
                });
                info!("readiness mounted");
            } else {
                debug!("readiness already mounted");
            }
        }

        self.reconciliation.run().await
    }

    /// Release every listener and stop polling.
    pub fn teardown(&self) {
        let attached = self.lock_attached().take();
        if let Some(Attached {
            mut listeners,
            login_watcher,
        }) = attached
        {
            listeners.detach();
            login_watcher.abort();
            info!("readiness unmounted");
        }
        self.coordinator.shutdown();
    }

    pub fn is_mounted(&self) -> bool {
        self.lock_attached().is_some()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_running()
    }

    /// Request a polling session outside the automatic triggers.
    pub async fn start_polling(&self, reason: PollReason) -> ReadinessSnapshot {
        self.coordinator.start_polling(reason).await
    }

    pub fn state(&self) -> ReadinessState {
        self.coordinator.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.coordinator.subscribe()
    }

    pub async fn snapshot(&self) -> ReadinessSnapshot {
        self.coordinator.snapshot().await
    }

    pub fn coordinator(&self) -> &Arc<ReadinessCoordinator> {
        &self.coordinator
    }

    fn lock_attached(&self) -> MutexGuard<'_, Option<Attached>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ReadinessMount {
    fn drop(&mut self) {
        self.teardown();
        self.dispatcher
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown();
    }
}
