use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Monotonic identifier of one backend health polling session.
///
/// Allocated by the state machine so that a success reported by a superseded
/// session can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PollEpisode(u64);

impl PollEpisode {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for PollEpisode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "poll-{}", self.0)
    }
}

/// Why a polling session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollReason {
    /// Tools were found installed during mount reconciliation.
    AlreadyInstalled,
    /// A user logged in while a backend restart was pending.
    LoginRestart,
    /// Explicit request from the UI layer.
    Manual,
}

impl Display for PollReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PollReason::AlreadyInstalled => "already_installed",
            PollReason::LoginRestart => "login_restart",
            PollReason::Manual => "manual",
        };
        f.write_str(name)
    }
}
