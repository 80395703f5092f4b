use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

use lp_app::{ReadinessMount, ReadinessMountDeps};
use lp_core::config::PollerConfig;
use lp_core::onboarding::InitStage;
use lp_core::ports::{
    BackendLocatorPort, ClockPort, HealthProbeError, HealthProbePort, InstallationStatus,
    InstallerEvent, InstallerEventSource, InstallerPort, ReadinessUiPort, SessionSnapshot,
    SessionStatePort, ToolInstallStatus,
};
use lp_core::readiness::{BackendOutcome, InstallLogEntry, InstallOutcome, LogStream};
use lp_core::{PollEpisode, ReadinessEvent, ReadinessState};

struct MockInstaller {
    installed: bool,
    checks: AtomicUsize,
    events: broadcast::Sender<InstallerEvent>,
}

#[async_trait]
impl InstallerPort for MockInstaller {
    async fn check_tool_installed(&self) -> anyhow::Result<ToolInstallStatus> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(ToolInstallStatus {
            success: true,
            is_installed: self.installed,
        })
    }

    async fn installation_status(&self) -> anyhow::Result<InstallationStatus> {
        Ok(InstallationStatus {
            success: true,
            is_installing: false,
        })
    }

    async fn perform_installation(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl InstallerEventSource for MockInstaller {
    fn subscribe(&self) -> broadcast::Receiver<InstallerEvent> {
        self.events.subscribe()
    }
}

/// Backend reachable on `port` once `healthy_after` probes have failed.
struct MockBackend {
    port: Option<u16>,
    healthy_after: Option<usize>,
    probes: AtomicUsize,
}

#[async_trait]
impl BackendLocatorPort for MockBackend {
    async fn backend_port(&self) -> anyhow::Result<Option<u16>> {
        Ok(self.port)
    }
}

#[async_trait]
impl HealthProbePort for MockBackend {
    async fn probe(&self, _port: u16) -> Result<(), HealthProbeError> {
        let call = self.probes.fetch_add(1, Ordering::SeqCst);
        match self.healthy_after {
            Some(after) if call >= after => Ok(()),
            _ => Err(HealthProbeError::Unreachable("connection refused".into())),
        }
    }
}

#[derive(Default)]
struct RecordingUi {
    calls: Mutex<Vec<String>>,
    stage: Mutex<InitStage>,
}

impl RecordingUi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadinessUiPort for RecordingUi {
    async fn start_installation(&self) -> anyhow::Result<()> {
        self.record("start_installation");
        Ok(())
    }
    async fn add_log(&self, entry: InstallLogEntry) -> anyhow::Result<()> {
        self.record(format!("log:{}", entry.data));
        Ok(())
    }
    async fn set_success(&self) -> anyhow::Result<()> {
        self.record("success");
        Ok(())
    }
    async fn set_error(&self, message: &str) -> anyhow::Result<()> {
        self.record(format!("error:{message}"));
        Ok(())
    }
    async fn set_backend_error(&self, message: &str) -> anyhow::Result<()> {
        self.record(format!("backend_error:{message}"));
        Ok(())
    }
    async fn set_waiting_backend(&self) -> anyhow::Result<()> {
        self.record("waiting_backend");
        Ok(())
    }
    async fn init_stage(&self) -> anyhow::Result<InitStage> {
        Ok(*self.stage.lock().unwrap())
    }
    async fn set_init_stage(&self, stage: InitStage) -> anyhow::Result<()> {
        *self.stage.lock().unwrap() = stage;
        Ok(())
    }
}

struct MockSession {
    tx: watch::Sender<SessionSnapshot>,
    clears: AtomicUsize,
}

#[async_trait]
impl SessionStatePort for MockSession {
    async fn snapshot(&self) -> anyhow::Result<SessionSnapshot> {
        Ok(self.tx.borrow().clone())
    }

    async fn clear_needs_backend_restart(&self) -> anyhow::Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.tx.send_modify(|s| s.needs_backend_restart = false);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

struct FixedClock;

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        1_700_000_000_000
    }
}

struct TestMocks {
    installer: Arc<MockInstaller>,
    backend: Arc<MockBackend>,
    ui: Arc<RecordingUi>,
    session: Arc<MockSession>,
}

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("lp_app=debug"))
        .with_test_writer()
        .try_init();
}

fn test_fixtures(
    installed: bool,
    backend: MockBackend,
    session: SessionSnapshot,
) -> (TestMocks, ReadinessMount) {
    init_test_tracing();
    let (events, _) = broadcast::channel(32);
    let installer = Arc::new(MockInstaller {
        installed,
        checks: AtomicUsize::new(0),
        events,
    });
    let backend = Arc::new(backend);
    let ui = Arc::new(RecordingUi::default());
    let (tx, _) = watch::channel(session);
    let session = Arc::new(MockSession {
        tx,
        clears: AtomicUsize::new(0),
    });

    let mount = ReadinessMount::new(ReadinessMountDeps {
        installer: installer.clone(),
        installer_events: installer.clone(),
        locator: backend.clone(),
        probe: backend.clone(),
        ui: ui.clone(),
        session: session.clone(),
        clock: Arc::new(FixedClock),
        poller: PollerConfig::default(),
    });

    (
        TestMocks {
            installer,
            backend,
            ui,
            session,
        },
        mount,
    )
}

fn backend(port: Option<u16>, healthy_after: Option<usize>) -> MockBackend {
    MockBackend {
        port,
        healthy_after,
        probes: AtomicUsize::new(0),
    }
}

async fn wait_for_state(
    mount: &ReadinessMount,
    predicate: impl Fn(&ReadinessState) -> bool,
) -> ReadinessState {
    let mut rx = mount.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(120), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for readiness state")
        .expect("readiness state channel closed")
        .clone();
    // The snapshot lock is held until the transition's side effects are done.
    mount.snapshot().await;
    state
}

#[tokio::test(start_paused = true)]
async fn already_installed_tools_become_ready_on_third_tick() {
    // Immediate check plus ticks 1 and 2 fail, tick 3 succeeds.
    let (mocks, mount) = test_fixtures(true, backend(Some(5000), Some(3)), SessionSnapshot::default());
    let started = Instant::now();

    let report = mount.mount().await;
    assert_eq!(report.tool_installed, Some(true));

    wait_for_state(&mount, ReadinessState::is_ready).await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(7), "elapsed {elapsed:?}");

    let snapshot = mount.snapshot().await;
    assert!(snapshot.flags.installation_complete);
    assert!(snapshot.flags.backend_ready);
    assert_eq!(snapshot.backend_port, Some(5000));
    assert_eq!(mocks.backend.probes.load(Ordering::SeqCst), 4);
    assert_eq!(mocks.ui.count("success"), 1);
    assert_eq!(mocks.ui.count("start_installation"), 0);
}

#[tokio::test(start_paused = true)]
async fn healthy_backend_is_ready_without_interval_polling() {
    let (mocks, mount) = test_fixtures(true, backend(Some(5000), Some(0)), SessionSnapshot::default());

    mount.mount().await;
    wait_for_state(&mount, ReadinessState::is_ready).await;

    assert_eq!(mount.coordinator().poller().interval_sessions_started(), 0);
    assert_eq!(mocks.backend.probes.load(Ordering::SeqCst), 1);
    assert_eq!(mocks.session.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn duplicate_health_success_declares_ready_once() {
    let (mocks, mount) = test_fixtures(true, backend(Some(5000), Some(0)), SessionSnapshot::default());

    mount.mount().await;
    wait_for_state(&mount, ReadinessState::is_ready).await;

    // A late tick from the same episode.
    let snapshot = mount
        .coordinator()
        .dispatch(ReadinessEvent::BackendHealthy {
            episode: PollEpisode::new(1),
            port: 5000,
        })
        .await;

    assert!(snapshot.state.is_ready());
    assert_eq!(mocks.ui.count("success"), 1);
    assert_eq!(mocks.session.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn installation_failure_is_surfaced_with_reason() {
    let (mocks, mount) = test_fixtures(false, backend(None, None), SessionSnapshot::default());
    mount.mount().await;

    let events = &mocks.installer.events;
    events.send(InstallerEvent::InstallStarted).unwrap();
    events
        .send(InstallerEvent::InstallLog {
            kind: LogStream::Stderr,
            data: "No space left on device".into(),
        })
        .unwrap();
    events
        .send(InstallerEvent::BackendReady(BackendOutcome::started(5001)))
        .unwrap();
    events
        .send(InstallerEvent::InstallCompleted(InstallOutcome::failed(
            "disk full",
        )))
        .unwrap();

    let state = wait_for_state(&mount, ReadinessState::is_error).await;
    assert_eq!(
        state,
        ReadinessState::InstallationFailed {
            reason: "disk full".into()
        }
    );

    let snapshot = mount.snapshot().await;
    assert!(!snapshot.flags.installation_complete);
    assert!(snapshot.flags.backend_ready);
    assert_eq!(snapshot.active_episode, None);
    assert_eq!(mount.coordinator().poller().interval_sessions_started(), 0);
    assert!(!mount.coordinator().poller().is_polling());

    assert_eq!(
        mocks.ui.calls(),
        vec![
            "start_installation",
            "log:No space left on device",
            "error:disk full",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn login_after_logout_waits_for_backend_again() {
    let session = SessionSnapshot {
        user_id: Some("user-2".into()),
        needs_backend_restart: true,
    };
    let (mocks, mount) = test_fixtures(false, backend(None, None), session);
    mount.mount().await;

    wait_for_state(&mount, |s| *s == ReadinessState::WaitingBackend).await;
    let snapshot = mount.snapshot().await;
    assert!(snapshot.flags.installation_complete);
    assert!(!snapshot.flags.backend_ready);
    assert!(snapshot.active_episode.is_some());
    assert!(mocks.session.tx.borrow().needs_backend_restart);

    mocks
        .installer
        .events
        .send(InstallerEvent::BackendReady(BackendOutcome::started(5001)))
        .unwrap();

    wait_for_state(&mount, ReadinessState::is_ready).await;
    let snapshot = mount.snapshot().await;
    assert_eq!(snapshot.backend_port, Some(5001));
    assert_eq!(snapshot.active_episode, None);
    assert!(!mocks.session.tx.borrow().needs_backend_restart);
    assert!(!mount.coordinator().poller().is_polling());
    assert_eq!(mocks.ui.count("success"), 1);
}

#[tokio::test(start_paused = true)]
async fn relogin_while_mounted_restarts_backend_wait() {
    let session = SessionSnapshot {
        user_id: Some("user-1".into()),
        needs_backend_restart: false,
    };
    let (mocks, mount) = test_fixtures(true, backend(None, None), session);
    mount.mount().await;

    let events = &mocks.installer.events;
    events
        .send(InstallerEvent::BackendReady(BackendOutcome::started(5000)))
        .unwrap();
    wait_for_state(&mount, ReadinessState::is_ready).await;

    mocks.session.tx.send_modify(|s| {
        s.user_id = None;
        s.needs_backend_restart = true;
    });
    mocks
        .session
        .tx
        .send_modify(|s| s.user_id = Some("user-2".into()));

    wait_for_state(&mount, |s| *s == ReadinessState::WaitingBackend).await;
    let snapshot = mount.snapshot().await;
    assert!(snapshot.flags.installation_complete);
    assert!(!snapshot.flags.backend_ready);
    assert!(snapshot.active_episode.is_some());

    events
        .send(InstallerEvent::BackendReady(BackendOutcome::started(5001)))
        .unwrap();
    wait_for_state(&mount, ReadinessState::is_ready).await;

    let snapshot = mount.snapshot().await;
    assert_eq!(snapshot.backend_port, Some(5001));
    assert!(!mocks.session.tx.borrow().needs_backend_restart);
    assert_eq!(mocks.ui.count("success"), 2);
    assert_eq!(mocks.ui.count("waiting_backend"), 2);
}

#[tokio::test(start_paused = true)]
async fn polling_stops_at_ceiling_and_keeps_waiting() {
    let (mocks, mount) = test_fixtures(true, backend(Some(5000), None), SessionSnapshot::default());
    mount.mount().await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    let snapshot = mount.snapshot().await;
    assert_eq!(snapshot.state, ReadinessState::WaitingBackend);
    assert_eq!(snapshot.active_episode, None);
    assert!(!mount.coordinator().poller().is_polling());

    let probes = mocks.backend.probes.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(mocks.backend.probes.load(Ordering::SeqCst), probes);
    assert_eq!(mocks.ui.count("backend_error:backend failed to start"), 0);
}

#[tokio::test(start_paused = true)]
async fn mounting_twice_matches_mounting_once() {
    let (mocks, mount) = test_fixtures(true, backend(Some(5000), Some(0)), SessionSnapshot::default());

    mount.mount().await;
    mount.mount().await;
    wait_for_state(&mount, ReadinessState::is_ready).await;

    assert_eq!(mocks.installer.checks.load(Ordering::SeqCst), 1);
    assert_eq!(mocks.installer.events.receiver_count(), 1);
    assert_eq!(mocks.ui.count("success"), 1);
    assert_eq!(mocks.ui.count("waiting_backend"), 1);
}
