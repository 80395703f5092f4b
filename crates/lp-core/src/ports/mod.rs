//! Port interfaces for the application layer
//!
//! Ports define the contract between the readiness use cases and the
//! collaborators they coordinate: the installer subsystem, the backend
//! process, the session/auth store and the UI layer. Implementations live in
//! `lp-infra` and `lp-runtime`.

mod backend;
mod clock;
pub mod errors;
pub mod installer;
mod readiness_ui;
pub mod session;

pub use backend::{BackendLocatorPort, HealthProbePort};
pub use clock::ClockPort;
pub use errors::HealthProbeError;
pub use installer::{
    InstallationStatus, InstallerEvent, InstallerEventSource, InstallerPort, ToolInstallStatus,
};
pub use readiness_ui::ReadinessUiPort;
pub use session::{SessionSnapshot, SessionStatePort};
