//! # lp-infra
//!
//! Adapters for the readiness ports: HTTP health probing, backend port
//! discovery, the file-backed session store, the process installer and the
//! system clock.

pub mod backend;
pub mod health;
pub mod installer;
pub mod session;
pub mod time;

pub use backend::{PortFileLocator, StaticBackendLocator};
pub use health::HttpHealthProbe;
pub use installer::ProcessInstaller;
pub use session::FileSessionStore;
pub use time::SystemClock;
