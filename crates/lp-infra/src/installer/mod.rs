//! Local dependency installer.

mod process_installer;

pub use process_installer::{InstallerError, ProcessInstaller, DEFAULT_MARKER_FILE};
