use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shotter_rpc_bridge::ServiceCall;

use crate::errors::ShotterResult;
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ServiceCallBody {
    target: Value,
    service_data: Value,
}

/// Forwards one service call; the body is optional.
pub(super) async fn call_service(
    State(state): State<AppState>,
    Path((domain, service)): Path<(String, String)>,
    body: Option<Json<ServiceCallBody>>,
) -> ShotterResult<Json<Value>> {
    let Json(body) = body.unwrap_or_default();
    let call = ServiceCall::new(domain, service)
        .with_target(body.target)
        .with_service_data(body.service_data);
    let response = state.services.call(&call, state.service_deadline).await?;
    Ok(Json(json!({ "response": response })))
}
