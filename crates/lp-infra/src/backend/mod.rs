//! Backend port discovery.

mod locator;

pub use locator::{locator_from_config, PortFileLocator, StaticBackendLocator};
