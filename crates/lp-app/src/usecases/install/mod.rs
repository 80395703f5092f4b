//! Installation use cases

pub mod perform_installation;

pub use perform_installation::PerformInstallation;
