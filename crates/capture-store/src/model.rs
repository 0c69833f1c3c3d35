use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::errors::{StoreErrKind, StoreError};

/// Private staging artifact written by the renderer before post-processing.
pub const STAGING_FILE_NAME: &str = "capture_tmp.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Png,
    Bmp,
}

impl CaptureFormat {
    pub const ALL: [CaptureFormat; 2] = [CaptureFormat::Png, CaptureFormat::Bmp];

    pub fn extension(self) -> &'static str {
        match self {
            CaptureFormat::Png => "png",
            CaptureFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            CaptureFormat::Png => "image/png",
            CaptureFormat::Bmp => "image/bmp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == ext)
    }
}

impl Default for CaptureFormat {
    fn default() -> Self {
        CaptureFormat::Png
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for CaptureFormat {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_extension(&value.trim().to_ascii_lowercase())
            .ok_or_else(|| StoreErrKind::UnknownFormat(value.to_string()).into())
    }
}

/// A persisted capture, named `{timestamp}_{name}.{format}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureFile {
    pub timestamp: i64,
    pub name: String,
    pub format: CaptureFormat,
}

impl CaptureFile {
    pub fn new(timestamp: i64, name: impl Into<String>, format: CaptureFormat) -> Self {
        Self {
            timestamp,
            name: name.into(),
            format,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.timestamp, self.name, self.format.extension())
    }

    /// Recovers `(timestamp, name, format)` from a file name.
    ///
    /// The timestamp is everything before the first `_` and must be an
    /// integer without leading zeros, so `file_name` rebuilds the same path.
    /// The name runs up to the final `.`. The staging file, empty stream ids
    /// and names carrying path separators are rejected.
    pub fn parse(file_name: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::from(StoreErrKind::InvalidFileName(file_name.to_string()));
        if file_name == STAGING_FILE_NAME {
            return Err(invalid());
        }
        let (stem, ext) = file_name.rsplit_once('.').ok_or_else(invalid)?;
        let format = CaptureFormat::from_extension(ext).ok_or_else(invalid)?;
        let (ts, name) = stem.split_once('_').ok_or_else(invalid)?;
        if name.is_empty()
            || name.contains(['/', '\\'])
            || ts.is_empty()
            || !ts.bytes().all(|b| b.is_ascii_digit())
            || (ts.len() > 1 && ts.starts_with('0'))
        {
            return Err(invalid());
        }
        let timestamp = ts.parse::<i64>().map_err(|_| invalid())?;
        Ok(Self::new(timestamp, name, format))
    }

    /// Local wall-clock time of the capture.
    pub fn datetime(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.timestamp, 0).single()
    }
}

impl fmt::Display for CaptureFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
