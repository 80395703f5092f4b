pub mod config;
pub mod paths;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, load_config_or_default, resolve_config_path};
pub use paths::AppPaths;
pub use run::run_app;
pub use wiring::{wire_readiness, ReadinessRuntime};
