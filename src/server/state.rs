use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shotter_rpc_bridge::{BridgeConnector, BridgeError, RpcBridge, ServiceCall};

use crate::capture::{CaptureOrchestrator, CaptureTarget, RoundTracker};
use crate::config::AppConfig;

/// Deadline applied to service calls issued through the HTTP API.
pub const SERVICE_CALL_DEADLINE: Duration = Duration::from_millis(2000);

/// Seam between the HTTP layer and the RPC bridge.
#[async_trait]
pub trait ServiceCaller: Send + Sync {
    async fn call(&self, call: &ServiceCall, deadline: Duration) -> Result<Value, BridgeError>;
}

#[async_trait]
impl<C: BridgeConnector> ServiceCaller for RpcBridge<C> {
    async fn call(&self, call: &ServiceCall, deadline: Duration) -> Result<Value, BridgeError> {
        self.call_service_with_deadline(call, deadline).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) orchestrator: Arc<CaptureOrchestrator>,
    pub(crate) targets: Arc<[CaptureTarget]>,
    pub(crate) services: Arc<dyn ServiceCaller>,
    pub(crate) rounds: Arc<RoundTracker>,
    pub(crate) service_deadline: Duration,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        orchestrator: Arc<CaptureOrchestrator>,
        targets: Arc<[CaptureTarget]>,
        services: Arc<dyn ServiceCaller>,
        rounds: Arc<RoundTracker>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            targets,
            services,
            rounds,
            service_deadline: SERVICE_CALL_DEADLINE,
        }
    }

    pub fn with_service_deadline(mut self, deadline: Duration) -> Self {
        self.service_deadline = deadline;
        self
    }

    pub(crate) fn target(&self, name: &str) -> Option<&CaptureTarget> {
        self.targets.iter().find(|target| target.name == name)
    }
}
