//! # lp-runtime
//!
//! Process bootstrap for Launchpad: configuration loading, tracing setup,
//! dependency wiring and the run loop that mounts readiness for one
//! application session.

pub mod adapters;
pub mod bootstrap;

pub use bootstrap::{run_app, AppPaths};
