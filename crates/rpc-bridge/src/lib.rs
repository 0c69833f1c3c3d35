//! One-shot service calls over the Home Assistant websocket API.
//!
//! Each call opens its own connection, authenticates, sends a single
//! `call_service` command and waits for the result carrying the same id.

pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod transport;

pub use bridge::{BridgeState, RpcBridge};
pub use endpoint::websocket_url;
pub use error::BridgeError;
pub use protocol::ServiceCall;
pub use transport::{BridgeChannel, BridgeConnector, WsConnector};
