//! # lp-core
//!
//! Core domain models and business logic for Launchpad.
//!
//! This crate contains the readiness state machine and the port contracts
//! consumed by the application layer. It has no infrastructure dependencies.

pub mod config;
pub mod onboarding;
pub mod ports;
pub mod readiness;

pub use config::ReadinessConfig;
pub use onboarding::InitStage;
pub use readiness::{
    CompositeReadiness, PollEpisode, PollReason, ReadinessAction, ReadinessEvent, ReadinessFlags,
    ReadinessSnapshot, ReadinessState, ReadinessStateMachine,
};
