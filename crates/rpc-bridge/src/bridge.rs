use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::BridgeError;
use crate::protocol::{ClientMessage, ServerMessage, ServiceCall};
use crate::transport::{BridgeChannel, BridgeConnector};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    AwaitingAuthRequired,
    AuthSent,
    AwaitingResult,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BridgeState::AwaitingAuthRequired => "awaiting_auth_required",
            BridgeState::AuthSent => "auth_sent",
            BridgeState::AwaitingResult => "awaiting_result",
        })
    }
}

/// Issues service calls, one connection per call.
pub struct RpcBridge<C> {
    connector: C,
    access_token: String,
    next_id: AtomicU64,
}

impl<C: BridgeConnector> RpcBridge<C> {
    pub fn new(connector: C, access_token: impl Into<String>) -> Self {
        Self {
            connector,
            access_token: access_token.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connects, authenticates, sends `call` and waits for its result.
    ///
    /// The connection is closed before returning, whatever the outcome.
    pub async fn call_service(&self, call: &ServiceCall) -> Result<Value, BridgeError> {
        let call_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut channel = self.connector.connect().await?;
        let outcome = self.drive(channel.as_mut(), call_id, call).await;
        channel.close().await;
        match &outcome {
            Ok(_) => info!(
                target: "rpc-bridge",
                call_id,
                domain = %call.domain,
                service = %call.service,
                "service call resolved"
            ),
            Err(err) => warn!(
                target: "rpc-bridge",
                call_id,
                domain = %call.domain,
                service = %call.service,
                %err,
                "service call failed"
            ),
        }
        outcome
    }

    /// [`Self::call_service`] bounded by `deadline`.
    ///
    /// On expiry the in-flight call is dropped, which drops its socket.
    pub async fn call_service_with_deadline(
        &self,
        call: &ServiceCall,
        deadline: Duration,
    ) -> Result<Value, BridgeError> {
        match tokio::time::timeout(deadline, self.call_service(call)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    target: "rpc-bridge",
                    domain = %call.domain,
                    service = %call.service,
                    deadline_ms = deadline.as_millis() as u64,
                    "service call timed out"
                );
                Err(BridgeError::Timeout {
                    deadline_ms: deadline.as_millis() as u64,
                })
            }
        }
    }

    async fn drive(
        &self,
        channel: &mut dyn BridgeChannel,
        call_id: u64,
        call: &ServiceCall,
    ) -> Result<Value, BridgeError> {
        let mut state = BridgeState::AwaitingAuthRequired;
        loop {
            let frame = match channel.recv().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => return Err(err),
                None => {
                    debug!(target: "rpc-bridge", %state, "peer closed the connection");
                    return Err(BridgeError::ConnectionClosed);
                }
            };
            let message: ServerMessage = match serde_json::from_str(&frame) {
                Ok(message) => message,
                Err(err) => {
                    debug!(target: "rpc-bridge", %state, %err, "ignoring unparseable frame");
                    continue;
                }
            };

            state = match (state, message) {
                (BridgeState::AwaitingAuthRequired, ServerMessage::AuthRequired {}) => {
                    let auth = ClientMessage::Auth {
                        access_token: &self.access_token,
                    };
                    channel.send(auth.to_frame()?).await?;
                    BridgeState::AuthSent
                }
                (
                    BridgeState::AwaitingAuthRequired | BridgeState::AuthSent,
                    ServerMessage::AuthInvalid { message },
                ) => return Err(BridgeError::AuthInvalid(message)),
                (BridgeState::AuthSent, ServerMessage::AuthOk {}) => {
                    let command = ClientMessage::CallService {
                        id: call_id,
                        domain: &call.domain,
                        service: &call.service,
                        service_data: &call.service_data,
                        target: &call.target,
                        return_response: true,
                    };
                    channel.send(command.to_frame()?).await?;
                    BridgeState::AwaitingResult
                }
                (BridgeState::AwaitingResult, ServerMessage::Result(result))
                    if result.id == call_id =>
                {
                    return result.into_outcome();
                }
                (state, other) => {
                    debug!(target: "rpc-bridge", %state, kind = other.kind(), "ignoring message");
                    state
                }
            };
        }
    }
}
