use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, ENV_CONFIG_PATH};

pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.context("Failed to install the log subscriber")?;

    Ok(())
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    /// False when the file was missing and defaults were used.
    pub found: bool,
}

/// Resolves the config path: `--config`, then `SHOTTER_CONFIG`, then
/// `./config/config.yaml`, then the user config directory.
pub fn resolve_config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    if let Ok(path) = env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path.trim()));
        }
    }
    let local_config = PathBuf::from("config/config.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("shotter");
    path.push("config.yaml");
    Ok(path)
}

/// Reads, overrides from the environment and validates the configuration.
///
/// Runs before logging is installed, so it reports through its return
/// value rather than `tracing`.
pub async fn load_config(config_path: &Path) -> Result<LoadedConfig> {
    let (mut config, found) = if config_path.exists() {
        let content = fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config = AppConfig::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        (config, true)
    } else {
        (AppConfig::default(), false)
    };

    config.apply_env_overrides(|key| env::var(key).ok());
    config.validate()?;

    Ok(LoadedConfig {
        config,
        path: config_path.to_path_buf(),
        found,
    })
}
