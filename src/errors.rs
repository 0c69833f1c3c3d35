//! Error handling for the binary crate
//!
//! Library crates keep their own `thiserror` enums; this type folds them
//! together for the HTTP layer and the CLI boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shotter_capture_store::{StoreErrKind, StoreError};
use shotter_capture_visual::VisualError;
use shotter_rpc_bridge::BridgeError;
use shotter_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShotterError {
    /// Invalid or inconsistent configuration, detected once after loading.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("target '{0}' not found")]
    UnknownTarget(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Visual(#[from] VisualError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShotterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status used when the error reaches the API layer.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShotterError::UnknownTarget(_) => StatusCode::NOT_FOUND,
            ShotterError::Store(err) => match err.kind() {
                StoreErrKind::NotFound(_) | StoreErrKind::InvalidFileName(_) => {
                    StatusCode::NOT_FOUND
                }
                StoreErrKind::UnknownFormat(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ShotterError::Bridge(err) => match err {
                BridgeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                BridgeError::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
                BridgeError::Remote { .. } => StatusCode::BAD_GATEWAY,
                BridgeError::InvalidEndpoint(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            ShotterError::Configuration(_)
            | ShotterError::Visual(_)
            | ShotterError::Scheduler(_)
            | ShotterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShotterError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(target: "http", err = %self, %status, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ShotterResult<T> = Result<T, ShotterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_map_to_gateway_statuses() {
        let timeout = ShotterError::from(BridgeError::Timeout { deadline_ms: 2000 });
        assert_eq!(timeout.http_status(), StatusCode::GATEWAY_TIMEOUT);

        let auth = ShotterError::from(BridgeError::AuthInvalid("bad token".into()));
        assert_eq!(auth.http_status(), StatusCode::UNAUTHORIZED);

        let remote = ShotterError::from(BridgeError::Remote {
            code: "not_found".into(),
            message: "Service not found.".into(),
        });
        assert_eq!(remote.http_status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_capture_is_not_found() {
        let err = ShotterError::from(StoreError::new(StoreErrKind::NotFound("x.png".into())));
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ShotterError::UnknownTarget("kitchen".into()).to_string(),
            "target 'kitchen' not found"
        );
    }
}
