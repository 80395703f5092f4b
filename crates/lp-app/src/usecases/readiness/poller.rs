//! Backend health poller.
//!
//! A backend is ready when its port resolves and the health endpoint answers
//! with a success status. The poller checks once immediately and only falls
//! back to an interval loop when that fails. The loop is bounded by a hard
//! ceiling measured from the start of the session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lp_core::config::PollerConfig;
use lp_core::ports::{BackendLocatorPort, HealthProbePort};
use lp_core::{PollEpisode, PollReason, ReadinessEvent};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, trace, warn, Instrument, Span};

use super::ReadinessInbox;

/// How a call to [`BackendHealthPoller::start`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStart {
    /// The immediate check succeeded; no interval task was created.
    Immediate,
    /// An interval task is running until success or the ceiling.
    Scheduled,
    /// A newer session started, or this one was cancelled, during the immediate check.
    Superseded,
}

struct PollSession {
    episode: PollEpisode,
    abort: AbortHandle,
}

#[derive(Default)]
struct PollSlot {
    /// Most recently started episode that has not finished or been cancelled.
    latest: Option<PollEpisode>,
    /// Interval task of `latest`, once spawned.
    active: Option<PollSession>,
}

pub struct BackendHealthPoller {
    locator: Arc<dyn BackendLocatorPort>,
    probe: Arc<dyn HealthProbePort>,
    config: PollerConfig,
    inbox: ReadinessInbox,
    slot: Mutex<PollSlot>,
    interval_sessions: AtomicUsize,
}

impl BackendHealthPoller {
    pub fn new(
        locator: Arc<dyn BackendLocatorPort>,
        probe: Arc<dyn HealthProbePort>,
        config: PollerConfig,
        inbox: ReadinessInbox,
    ) -> Self {
        Self {
            locator,
            probe,
            config,
            inbox,
            slot: Mutex::new(PollSlot::default()),
            interval_sessions: AtomicUsize::new(0),
        }
    }

    /// Start a polling session, cancelling any session that is still running.
    ///
    /// The result is reported to the readiness inbox as
    /// [`ReadinessEvent::BackendHealthy`] or [`ReadinessEvent::PollExpired`].
    pub async fn start(self: &Arc<Self>, episode: PollEpisode, reason: PollReason) -> PollStart {
        let deadline = self.claim(episode);
        self.run_claimed(episode, reason, deadline).await
    }

    /// Claim the session slot now and run the session in the background.
    ///
    /// A cancel issued after this returns always reaches the new session.
    pub fn spawn(
        self: &Arc<Self>,
        episode: PollEpisode,
        reason: PollReason,
    ) -> JoinHandle<PollStart> {
        let deadline = self.claim(episode);
        let poller = Arc::clone(self);
        tokio::spawn(async move { poller.run_claimed(episode, reason, deadline).await })
    }

    fn claim(&self, episode: PollEpisode) -> Instant {
        let mut slot = self.lock_slot();
        slot.latest = Some(episode);
        if let Some(previous) = slot.active.take() {
            previous.abort.abort();
            debug!(superseded = %previous.episode, %episode, "poll session superseded");
        }
        Instant::now() + self.config.ceiling()
    }

    async fn run_claimed(
        self: &Arc<Self>,
        episode: PollEpisode,
        reason: PollReason,
        deadline: Instant,
    ) -> PollStart {
        let span = info_span!("usecase.readiness.poll", %episode, %reason);
        async {
            if self.lock_slot().latest != Some(episode) {
                debug!("poll session cancelled before it started");
                return PollStart::Superseded;
            }
            if let Some(port) = self.check_once().await {
                info!(port, "backend healthy on immediate check");
                self.finish(episode);
                self.inbox
                    .notify(ReadinessEvent::BackendHealthy { episode, port })
                    .await;
                return PollStart::Immediate;
            }

            let mut slot = self.lock_slot();
            if slot.latest != Some(episode) {
                debug!("poll session superseded during immediate check");
                return PollStart::Superseded;
            }

            let poller = Arc::clone(self);
            let task = tokio::spawn(
                poller
                    .run_interval(episode, deadline)
                    .instrument(Span::current()),
            );
            slot.active = Some(PollSession {
                episode,
                abort: task.abort_handle(),
            });
            self.interval_sessions.fetch_add(1, Ordering::SeqCst);
            debug!(
                interval_secs = self.config.interval_secs,
                ceiling_secs = self.config.ceiling_secs,
                "backend not ready, polling"
            );
            PollStart::Scheduled
        }
        .instrument(span)
        .await
    }

    /// Cancel the session for `episode` if it is still the current one.
    pub fn cancel(&self, episode: PollEpisode) {
        let mut slot = self.lock_slot();
        if slot.latest == Some(episode) {
            slot.latest = None;
        }
        if slot
            .active
            .as_ref()
            .is_some_and(|session| session.episode == episode)
        {
            if let Some(session) = slot.active.take() {
                session.abort.abort();
                debug!(%episode, "poll session cancelled");
            }
        }
    }

    /// Cancel whatever session is running.
    pub fn cancel_all(&self) {
        let mut slot = self.lock_slot();
        slot.latest = None;
        if let Some(session) = slot.active.take() {
            session.abort.abort();
            debug!(episode = %session.episode, "poll session cancelled");
        }
    }

    /// Whether an interval task is currently running.
    pub fn is_polling(&self) -> bool {
        self.lock_slot().active.is_some()
    }

    /// Number of interval tasks created over the poller's lifetime.
    pub fn interval_sessions_started(&self) -> usize {
        self.interval_sessions.load(Ordering::SeqCst)
    }

    async fn run_interval(self: Arc<Self>, episode: PollEpisode, deadline: Instant) {
        let outcome = tokio::time::timeout_at(deadline, self.wait_until_healthy()).await;
        self.finish(episode);
        match outcome {
            Ok(port) => {
                info!(port, "backend healthy");
                self.inbox
                    .notify(ReadinessEvent::BackendHealthy { episode, port })
                    .await;
            }
            Err(_) => {
                // The UI keeps waiting; only an explicit backend failure surfaces an error.
                warn!(
                    ceiling_secs = self.config.ceiling_secs,
                    "backend health polling reached its ceiling without success"
                );
                self.inbox
                    .notify(ReadinessEvent::PollExpired { episode })
                    .await;
            }
        }
    }

    async fn wait_until_healthy(&self) -> u16 {
        let period = self.config.interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u32 = 0;
        loop {
            ticker.tick().await;
            tick += 1;
            if let Some(port) = self.check_once().await {
                debug!(tick, port, "health probe succeeded");
                return port;
            }
        }
    }

    /// Resolve the backend port and probe it once.
    async fn check_once(&self) -> Option<u16> {
        let port = match self.locator.backend_port().await {
            Ok(Some(port)) => port,
            Ok(None) => {
                trace!("backend port not published yet");
                return None;
            }
            Err(err) => {
                debug!(error = %err, "backend port lookup failed");
                return None;
            }
        };

        match self.probe.probe(port).await {
            Ok(()) => Some(port),
            Err(err) => {
                debug!(port, error = %err, "health probe failed");
                None
            }
        }
    }

    fn finish(&self, episode: PollEpisode) {
        let mut slot = self.lock_slot();
        if slot
            .active
            .as_ref()
            .is_some_and(|session| session.episode == episode)
        {
            slot.active = None;
        }
        if slot.latest == Some(episode) {
            slot.latest = None;
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, PollSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for BackendHealthPoller {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
