mod cli;

use anyhow::Context;
use clap::Parser;
use lp_core::ports::{InstallerPort, SessionStatePort};
use lp_core::ReadinessConfig;
use lp_infra::{FileSessionStore, ProcessInstaller};
use lp_runtime::bootstrap::tracing::init_tracing_subscriber;
use lp_runtime::bootstrap::{load_config_or_default, resolve_config_path};
use lp_runtime::{run_app, AppPaths};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let paths = AppPaths::resolve()?;
    init_tracing_subscriber(&paths)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| resolve_config_path(&paths));
    let config = load_config_or_default(&config_path)?;
    tracing::info!(config = %config_path.display(), data_dir = %paths.data_dir.display(), "launchpad starting");

    match cli.command() {
        Command::Run => run_app(config, paths).await,
        Command::Login { user_id } => open_session(&config, &paths).await?.login(user_id).await,
        Command::Logout => open_session(&config, &paths).await?.logout().await,
        Command::Status => print_status(&config, &paths).await,
    }
}

async fn open_session(config: &ReadinessConfig, paths: &AppPaths) -> anyhow::Result<FileSessionStore> {
    let path = config
        .session
        .state_file
        .clone()
        .unwrap_or_else(|| paths.session_file.clone());
    FileSessionStore::open(&path)
        .await
        .with_context(|| format!("Failed to open session file {}", path.display()))
}

async fn print_status(config: &ReadinessConfig, paths: &AppPaths) -> anyhow::Result<()> {
    let session = open_session(config, paths).await?.snapshot().await?;
    let installer = ProcessInstaller::from_config(&config.installer, paths.install_marker.clone());
    let tools = installer.check_tool_installed().await?;

    println!("user:                  {}", session.user_id.as_deref().unwrap_or("-"));
    println!("backend restart due:   {}", session.restart_due());
    println!("tools installed:       {}", tools.is_installed);
    println!("install marker:        {}", installer.marker_file().display());
    Ok(())
}
