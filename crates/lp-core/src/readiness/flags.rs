use serde::{Deserialize, Serialize};

/// The two readiness conditions owned by the coordinator.
///
/// 协调器持有的两个就绪条件。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessFlags {
    /// Local dependencies are installed.
    pub installation_complete: bool,
    /// Backend answered a health probe or reported a successful start.
    pub backend_ready: bool,
}

impl ReadinessFlags {
    pub fn both_set(&self) -> bool {
        self.installation_complete && self.backend_ready
    }

    /// Invalidate both conditions (fresh install cycle).
    pub fn reset(&mut self) {
        self.installation_complete = false;
        self.backend_ready = false;
    }
}
