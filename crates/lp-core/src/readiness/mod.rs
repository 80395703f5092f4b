//! Readiness domain module.
//!
//! Two independently signaled conditions (local installation and backend
//! startup) are folded into a single readiness state by a pure transition
//! function. Side effects are returned as [`ReadinessAction`]s and executed
//! by the application layer.

mod action;
mod event;
mod flags;
mod log_entry;
mod poll;
mod state;
pub mod state_machine;

pub use action::ReadinessAction;
pub use event::{BackendOutcome, InstallOutcome, ReadinessEvent};
pub use flags::ReadinessFlags;
pub use log_entry::{InstallLogEntry, LogStream};
pub use poll::{PollEpisode, PollReason};
pub use state::{CompositeReadiness, ReadinessState};
pub use state_machine::{join_check, ReadinessSnapshot, ReadinessStateMachine};
