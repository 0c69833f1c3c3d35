use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// A service invocation: `domain.service` applied to `target`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    #[serde(default)]
    pub target: Value,
    #[serde(default)]
    pub service_data: Value,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            target: Value::Null,
            service_data: Value::Null,
        }
    }

    pub fn with_target(mut self, target: Value) -> Self {
        self.target = target;
        self
    }

    pub fn with_service_data(mut self, data: Value) -> Self {
        self.service_data = data;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClientMessage<'a> {
    Auth {
        access_token: &'a str,
    },
    CallService {
        id: u64,
        domain: &'a str,
        service: &'a str,
        // null fails the remote's mapping schema, so absent fields are omitted
        #[serde(skip_serializing_if = "is_null")]
        service_data: &'a Value,
        #[serde(skip_serializing_if = "is_null")]
        target: &'a Value,
        return_response: bool,
    },
}

fn is_null(value: &&Value) -> bool {
    value.is_null()
}

impl ClientMessage<'_> {
    pub(crate) fn to_frame(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(|err| BridgeError::Protocol(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerMessage {
    AuthRequired {},
    AuthOk {},
    AuthInvalid {
        #[serde(default)]
        message: String,
    },
    Result(ResultMessage),
    #[serde(other)]
    Other,
}

impl ServerMessage {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ServerMessage::AuthRequired {} => "auth_required",
            ServerMessage::AuthOk {} => "auth_ok",
            ServerMessage::AuthInvalid { .. } => "auth_invalid",
            ServerMessage::Result(_) => "result",
            ServerMessage::Other => "other",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultMessage {
    pub id: u64,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteError {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub message: String,
}

impl ResultMessage {
    /// Response payload on success, `(code, message)` on failure.
    pub(crate) fn into_outcome(self) -> Result<Value, BridgeError> {
        if self.success {
            return Ok(self
                .result
                .and_then(|mut result| result.get_mut("response").map(Value::take))
                .unwrap_or(Value::Null));
        }
        let error = self.error.unwrap_or(RemoteError {
            code: Value::Null,
            message: String::new(),
        });
        let code = match error.code {
            Value::String(code) => code,
            Value::Null => "unknown_error".to_string(),
            other => other.to_string(),
        };
        Err(BridgeError::Remote {
            code,
            message: error.message,
        })
    }
}
