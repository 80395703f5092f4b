//! Onboarding domain models
//!
//! The onboarding flow walks the user through an intro carousel, a
//! permissions step and finally into the application. Installation state
//! gates how far the flow may resume after a restart.

use serde::{Deserialize, Serialize};

/// Onboarding UI stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStage {
    #[default]
    Carousel,
    Permissions,
    Done,
}

impl InitStage {
    /// Stage to resume at after the mount-time installation check.
    ///
    /// A permissions stage left over from a previous run is only valid once the
    /// tools are installed; otherwise the flow restarts at the carousel.
    /// Returns `None` when the current stage should be kept.
    pub fn resume_after_install_check(self, is_installed: bool) -> Option<InitStage> {
        match self {
            InitStage::Permissions if !is_installed => Some(InitStage::Carousel),
            _ => None,
        }
    }
}
