use serde::{Deserialize, Serialize};

use crate::errors::{StoreErrKind, StoreError};

pub const DEFAULT_KEEP_COUNT: usize = 10;

/// How many captures survive per (name, format) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct RetentionPolicy {
    keep_count: usize,
}

impl RetentionPolicy {
    pub fn new(keep_count: usize) -> Result<Self, StoreError> {
        if keep_count == 0 {
            return Err(StoreErrKind::InvalidKeepCount.into());
        }
        Ok(Self { keep_count })
    }

    pub fn keep_count(&self) -> usize {
        self.keep_count
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_count: DEFAULT_KEEP_COUNT,
        }
    }
}

impl TryFrom<usize> for RetentionPolicy {
    type Error = StoreError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RetentionPolicy> for usize {
    fn from(policy: RetentionPolicy) -> Self {
        policy.keep_count
    }
}
