//! Configuration domain models

mod readiness_config;

pub use readiness_config::{
    BackendConfig, InstallerConfig, PollerConfig, ReadinessConfig, SessionConfig,
};
