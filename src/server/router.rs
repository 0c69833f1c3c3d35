use axum::{
    extract::State,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

mod captures;
mod services;

use super::state::AppState;
use crate::config::AppConfig;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/config", get(config_handler))
        .route("/api/targets", get(captures::list_targets))
        .route("/api/captures", get(captures::list_all))
        .route("/api/captures/:filename", get(captures::details))
        .route("/api/targets/:name/captures", get(captures::list_for_target))
        .route("/api/targets/:name/captures/last", get(captures::last_for_target))
        .route("/api/targets/:name/capture", post(captures::capture_now))
        .route("/api/services/:domain/:service", post(services::call_service))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let rounds = state.rounds.snapshot();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "targets": state.targets.len(),
        "rounds": rounds.rounds,
        "failed_rounds": rounds.failures,
        "last_round_ts": rounds.last_round_at,
        "last_error": rounds.last_error,
    }))
}

/// Effective configuration; the access token is redacted.
async fn config_handler(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config.as_ref().clone())
}
