use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use render_adapter::{ChromiumBackend, RenderBackend};
use shotter_capture_store::CaptureStore;
use shotter_capture_visual::FallbackAssets;
use shotter_rpc_bridge::{RpcBridge, WsConnector};
use tracing::{info, warn};

use crate::capture::{build_targets, CaptureOrchestrator, CaptureTarget};
use crate::config::AppConfig;

/// Everything a command needs, built from the loaded configuration.
pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn shared_config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn targets(&self) -> Result<Vec<CaptureTarget>> {
        Ok(build_targets(&self.config)?)
    }

    pub fn store(&self) -> Result<CaptureStore> {
        Ok(CaptureStore::new(
            self.config.server.capture_path.clone(),
            self.config.retention_policy()?,
        ))
    }

    pub fn browser(&self) -> Arc<ChromiumBackend> {
        let render = self.config.render_config();
        if render.executable.as_os_str().is_empty() {
            warn!("No Chrome/Chromium executable found; captures will use the fallback image");
        }
        Arc::new(ChromiumBackend::new(render))
    }

    pub fn fallback_assets(&self) -> Result<FallbackAssets> {
        let assets = match &self.config.server.assets_path {
            Some(dir) => {
                info!(path = %dir.display(), "Loading fallback assets");
                FallbackAssets::from_dir(dir)
            }
            None => FallbackAssets::embedded(),
        };
        assets.context("Failed to load fallback assets")
    }

    pub fn orchestrator(&self, backend: Arc<dyn RenderBackend>) -> Result<CaptureOrchestrator> {
        let orchestrator =
            CaptureOrchestrator::new(backend, self.store()?, Arc::new(self.fallback_assets()?))
                .with_timezone(self.config.timezone.clone())
                .with_locale(self.config.locale.clone());
        Ok(orchestrator)
    }

    pub fn bridge(&self) -> Result<RpcBridge<WsConnector>> {
        let url = self.config.websocket_url()?;
        let token = &self.config.homeassistant.token;
        if token.is_empty() {
            warn!("homeassistant.token is empty; service calls will be rejected");
        }
        Ok(RpcBridge::new(WsConnector::new(url)?, token.clone()))
    }
}
