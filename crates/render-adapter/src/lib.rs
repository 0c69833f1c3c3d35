//! Rendering backend used by the capture orchestrator.
//!
//! The orchestrator talks to the [`RenderBackend`] and [`RenderPage`] traits;
//! [`chromium::ChromiumBackend`] implements them over the DevTools protocol
//! and [`UnavailableBackend`] stands in when no browser should be started.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::env;

use async_trait::async_trait;
use which::which;

pub mod chromium;
pub mod commands;

pub use chromium::ChromiumBackend;
pub use commands::{ContextOptions, Viewport, WaitUntil};
pub use config::RenderConfig;
pub use error::{AdapterError, AdapterErrorKind};

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("timed out")]
        Timeout,
        #[error("browser unavailable")]
        BrowserUnavailable,
        #[error("navigation failed")]
        Navigation,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to the orchestrator.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
        pub retriable: bool,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self {
                kind,
                hint: None,
                retriable: false,
            }
        }

        pub fn timeout(what: &str, after: std::time::Duration) -> Self {
            Self::new(AdapterErrorKind::Timeout)
                .with_hint(format!("{what} exceeded {} ms", after.as_millis()))
                .retriable(true)
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn retriable(mut self, flag: bool) -> Self {
            self.retriable = flag;
            self
        }

        pub fn is_timeout(&self) -> bool {
            self.kind == AdapterErrorKind::Timeout
        }
    }

    impl From<chromiumoxide::error::CdpError> for AdapterError {
        fn from(err: chromiumoxide::error::CdpError) -> Self {
            match err {
                chromiumoxide::error::CdpError::Timeout => {
                    AdapterError::new(AdapterErrorKind::Timeout)
                        .with_hint("devtools request timed out")
                        .retriable(true)
                }
                other => AdapterError::new(AdapterErrorKind::CdpIo).with_hint(other.to_string()),
            }
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::{env, path::PathBuf};

    /// Configuration for launching the headless browser.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RenderConfig {
        pub executable: PathBuf,
        pub headless: bool,
        pub no_sandbox: bool,
        pub launch_timeout_ms: u64,
        pub request_timeout_ms: u64,
        pub extra_args: Vec<String>,
    }

    impl Default for RenderConfig {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable().unwrap_or_default(),
                headless: resolve_headless_default(),
                no_sandbox: resolve_flag("SHOTTER_DISABLE_SANDBOX"),
                launch_timeout_ms: 20_000,
                request_timeout_ms: 30_000,
                extra_args: Vec::new(),
            }
        }
    }

    fn resolve_headless_default() -> bool {
        // "0", "false", "no", "off" mean headful
        match env::var("SHOTTER_HEADLESS") {
            Ok(value) => {
                let lower = value.to_ascii_lowercase();
                !matches!(lower.as_str(), "0" | "false" | "no" | "off")
            }
            Err(_) => true,
        }
    }

    fn resolve_flag(key: &str) -> bool {
        env::var(key)
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }
}

/// Opens isolated pages for single captures.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Acquires a fresh browser context and page configured by `options`.
    async fn open_page(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn RenderPage>, AdapterError>;
}

/// A page inside its own browser context. Closing it releases both.
#[async_trait]
pub trait RenderPage: Send {
    async fn goto(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), AdapterError>;

    async fn wait_ms(&mut self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Writes a PNG of the viewport to `path`.
    async fn screenshot(&mut self, path: &Path, timeout: Duration) -> Result<(), AdapterError>;

    async fn close(self: Box<Self>) -> Result<(), AdapterError>;
}

/// Backend that never renders; every acquisition fails with its reason.
#[derive(Clone, Debug)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RenderBackend for UnavailableBackend {
    async fn open_page(
        &self,
        _options: &ContextOptions,
    ) -> Result<Box<dyn RenderPage>, AdapterError> {
        Err(AdapterError::new(AdapterErrorKind::BrowserUnavailable).with_hint(self.reason.clone()))
    }
}

/// Finds a Chrome/Chromium binary: `SHOTTER_CHROME`, then `PATH`, then
/// well-known install locations.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SHOTTER_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("SHOTTER_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "chromium",
            "chromium-browser",
            "google-chrome-stable",
            "google-chrome",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "freebsd")))]
    {
        Vec::new()
    }
}
