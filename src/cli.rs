//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "launchpad", version, about = "Wait for local dependencies and the backend to become ready")]
pub struct Cli {
    /// Config file, overrides LAUNCHPAD_CONFIG.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Mount readiness and run until Ctrl+C (default).
    Run,
    /// Record a logged-in user.
    Login { user_id: String },
    /// Log out; the backend restarts on the next login.
    Logout,
    /// Print the persisted session and installation state.
    Status,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
