use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("connection failed: {0}")]
    Connect(String),
    /// Credential rejected; carries the server's message verbatim.
    #[error("authentication rejected: {0}")]
    AuthInvalid(String),
    /// The remote executed the call and reported a failure.
    #[error("{code}: {message}")]
    Remote { code: String, message: String },
    #[error("no result within {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },
    #[error("connection closed before the call resolved")]
    ConnectionClosed,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}
