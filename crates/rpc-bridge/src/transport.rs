use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::error::BridgeError;

/// Opens one exclusive connection per call.
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BridgeChannel>, BridgeError>;
}

/// Text-frame duplex channel. `recv` yields `None` once the peer closed.
#[async_trait]
pub trait BridgeChannel: Send {
    async fn send(&mut self, frame: String) -> Result<(), BridgeError>;
    async fn recv(&mut self) -> Option<Result<String, BridgeError>>;
    async fn close(&mut self);
}

#[derive(Clone, Debug)]
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(url: Url) -> Result<Self, BridgeError> {
        match url.scheme() {
            "ws" | "wss" => Ok(Self { url }),
            other => Err(BridgeError::InvalidEndpoint(format!(
                "unsupported scheme `{other}` in {url}"
            ))),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl BridgeConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn BridgeChannel>, BridgeError> {
        debug!(target: "rpc-bridge", url = %self.url, "connecting");
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|err| BridgeError::Connect(err.to_string()))?;
        Ok(Box::new(WsChannel { stream }))
    }
}

struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl BridgeChannel for WsChannel {
    async fn send(&mut self, frame: String) -> Result<(), BridgeError> {
        self.stream
            .send(Message::text(frame))
            .await
            .map_err(|err| match err {
                WsError::ConnectionClosed | WsError::AlreadyClosed => BridgeError::ConnectionClosed,
                other => BridgeError::Transport(other.to_string()),
            })
    }

    async fn recv(&mut self) -> Option<Result<String, BridgeError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!(target: "rpc-bridge", "dropping non-utf8 binary frame"),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(err) => return Some(Err(BridgeError::Transport(err.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(target: "rpc-bridge", ?err, "websocket close failed");
        }
    }
}
