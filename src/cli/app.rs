use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use super::commands::Commands;
use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, resolve_config_path, LoadedConfig};
use super::version::cmd_version;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    if matches!(cli.command, Commands::Version) {
        cmd_version();
        return Ok(());
    }

    let config_path = resolve_config_path(cli.config.as_ref())?;
    let LoadedConfig {
        config,
        path,
        found,
    } = load_config(&config_path).await?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.server.log_level.clone());
    init_logging(&level, cli.json_logs || config.server.log_json)?;

    info!("Starting shotter v{}", env!("CARGO_PKG_VERSION"));
    if found {
        info!("Loaded configuration from: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }

    let ctx = CliContext::new(config, path);
    match dispatch(cli.command, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
