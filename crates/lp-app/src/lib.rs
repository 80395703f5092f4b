//! Launchpad Application Orchestration Layer
//!
//! This crate contains the readiness use cases: the coordinator that owns
//! the readiness flags, the backend health poller, event ingress, mount-time
//! reconciliation and the login-triggered restart path.

pub mod usecases;

pub use usecases::readiness::{
    ReadinessCoordinator, ReadinessError, ReadinessMount, ReadinessMountDeps,
};
pub use usecases::PerformInstallation;
