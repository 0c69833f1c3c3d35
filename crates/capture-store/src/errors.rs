use std::io;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreErrKind {
    #[error("unsupported capture format `{0}`")]
    UnknownFormat(String),
    #[error("not a capture file name: `{0}`")]
    InvalidFileName(String),
    #[error("keep count must be at least 1")]
    InvalidKeepCount,
    #[error("capture not found: {0}")]
    NotFound(String),
    #[error("io failure: {0}")]
    IoFailed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(transparent)]
pub struct StoreError(pub StoreErrKind);

impl StoreError {
    pub fn new(kind: StoreErrKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &StoreErrKind {
        &self.0
    }
}

impl From<StoreErrKind> for StoreError {
    fn from(kind: StoreErrKind) -> Self {
        StoreError(kind)
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError(StoreErrKind::IoFailed(err.to_string()))
    }
}
