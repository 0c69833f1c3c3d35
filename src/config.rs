//! Application configuration
//!
//! Loaded once from YAML by the CLI, validated, then shared by value or
//! `Arc` with the orchestrator, the scheduler and the HTTP state.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use render_adapter::{RenderConfig, WaitUntil};
use serde::{Deserialize, Serialize};
use shotter_capture_store::{CaptureFormat, RetentionPolicy};
use url::Url;

use crate::errors::ShotterError;

pub const ENV_CONFIG_PATH: &str = "SHOTTER_CONFIG";
pub const ENV_CHROME: &str = "SHOTTER_CHROME";
pub const ENV_HA_TOKEN: &str = "SHOTTER_HA_TOKEN";

const DIMENSION_RANGE: std::ops::RangeInclusive<u32> = 100..=3000;
const SCALE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;
const PALETTE_RANGE: std::ops::RangeInclusive<u16> = 1..=256;
const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1000..=30_000;
const MAX_DELAY_MS: u64 = 30_000;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub homeassistant: HomeAssistantSettings,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub browser: BrowserSettings,
    pub capture: CaptureConfig,
    pub schedule: ScheduleSettings,
    pub views: Vec<ViewConfig>,
    pub remotes: Vec<RemoteConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub capture_path: PathBuf,
    pub keep_count: usize,
    /// Where configured views are served from; defaults to this server.
    pub base_url: Option<String>,
    /// Replaces the embedded placeholder and font.
    pub assets_path: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8089,
            capture_path: PathBuf::from("data/captures"),
            keep_count: 10,
            base_url: None,
            assets_path: None,
            log_level: "info".into(),
            log_json: false,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantSettings {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    /// Long-lived access token; never serialized in clear.
    #[serde(serialize_with = "redact_secret")]
    pub token: String,
}

impl Default for HomeAssistantSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8123,
            ssl: false,
            token: String::new(),
        }
    }
}

impl fmt::Debug for HomeAssistantSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("token", &redacted(&self.token))
            .finish()
    }
}

const REDACTED: &str = "<redacted>";

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        REDACTED
    }
}

fn redact_secret<S: serde::Serializer>(secret: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(redacted(secret))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            no_sandbox: false,
        }
    }
}

/// Per-target rendering and output settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub format: CaptureFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: f64,
    pub invert: bool,
    pub grayscale: bool,
    /// Adaptive palette size for PNG output.
    pub bit_depth: Option<u16>,
    pub wait_until: WaitUntil,
    /// Navigation and snapshot timeout in ms.
    pub timeout: u64,
    /// Extra wait in ms between navigation and snapshot.
    pub delay: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: CaptureFormat::Png,
            width: None,
            height: None,
            scale: 1.0,
            invert: false,
            grayscale: false,
            bit_depth: None,
            wait_until: WaitUntil::NetworkIdle,
            timeout: 5000,
            delay: None,
        }
    }
}

impl CaptureConfig {
    /// `(width, height)` when both are set.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// `self` with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &CaptureOverrides) -> CaptureConfig {
        CaptureConfig {
            format: overrides.format.unwrap_or(self.format),
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            scale: overrides.scale.unwrap_or(self.scale),
            invert: overrides.invert.unwrap_or(self.invert),
            grayscale: overrides.grayscale.unwrap_or(self.grayscale),
            bit_depth: overrides.bit_depth.or(self.bit_depth),
            wait_until: overrides.wait_until.unwrap_or(self.wait_until),
            timeout: overrides.timeout.unwrap_or(self.timeout),
            delay: overrides.delay.or(self.delay),
        }
    }

    pub fn validate(&self, scope: &str) -> Result<(), ShotterError> {
        let fail = |msg: String| Err(ShotterError::configuration(format!("{scope}: {msg}")));
        match (self.width, self.height) {
            (Some(w), Some(h)) => {
                if !DIMENSION_RANGE.contains(&w) || !DIMENSION_RANGE.contains(&h) {
                    return fail(format!(
                        "width and height must be within 100..=3000, got {w}x{h}"
                    ));
                }
            }
            (None, None) => {}
            _ => return fail("width and height must be set together".into()),
        }
        if !SCALE_RANGE.contains(&self.scale) {
            return fail(format!("scale must be within 1.0..=5.0, got {}", self.scale));
        }
        if let Some(depth) = self.bit_depth {
            if !PALETTE_RANGE.contains(&depth) {
                return fail(format!("bit_depth must be within 1..=256, got {depth}"));
            }
        }
        if !TIMEOUT_RANGE_MS.contains(&self.timeout) {
            return fail(format!(
                "timeout must be within 1000..=30000 ms, got {}",
                self.timeout
            ));
        }
        if let Some(delay) = self.delay {
            if delay == 0 || delay > MAX_DELAY_MS {
                return fail(format!("delay must be within 1..=30000 ms, got {delay}"));
            }
        }
        Ok(())
    }
}

/// Sparse [`CaptureConfig`] attached to a view or remote.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOverrides {
    pub format: Option<CaptureFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f64>,
    pub invert: Option<bool>,
    pub grayscale: Option<bool>,
    pub bit_depth: Option<u16>,
    pub wait_until: Option<WaitUntil>,
    pub timeout: Option<u64>,
    pub delay: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Seconds between capture rounds.
    pub interval: u64,
    pub wait_first: bool,
    /// Stop the schedule (and `serve`) at the first failed round.
    pub raise_exceptions: bool,
    /// Restricts scheduled rounds to these targets; empty means all.
    pub targets: Vec<String>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval: 60,
            wait_first: false,
            raise_exceptions: true,
            targets: Vec::new(),
        }
    }
}

impl ScheduleSettings {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

/// A dashboard view served under `base_url`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    /// Path relative to `base_url`; defaults to `views/{name}`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub capture: CaptureOverrides,
}

/// An arbitrary page captured by absolute URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub capture: CaptureOverrides,
}

impl AppConfig {
    /// Parses YAML; an empty document yields the defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ShotterError> {
        let document: serde_yaml::Value = serde_yaml::from_str(raw)
            .map_err(|err| ShotterError::configuration(format!("invalid YAML: {err}")))?;
        if document.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(document)
            .map_err(|err| ShotterError::configuration(format!("invalid configuration: {err}")))
    }

    /// Applies `SHOTTER_CHROME` and `SHOTTER_HA_TOKEN` through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(chrome) = lookup(ENV_CHROME).filter(|v| !v.trim().is_empty()) {
            self.browser.executable = Some(PathBuf::from(chrome.trim()));
        }
        if let Some(token) = lookup(ENV_HA_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.homeassistant.token = token.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ShotterError> {
        if self.server.keep_count == 0 {
            return Err(ShotterError::configuration(
                "server.keep_count must be at least 1",
            ));
        }
        if self.schedule.interval == 0 {
            return Err(ShotterError::configuration(
                "schedule.interval must be at least 1 second",
            ));
        }
        if let Some(base) = &self.server.base_url {
            Url::parse(base).map_err(|err| {
                ShotterError::configuration(format!("server.base_url `{base}`: {err}"))
            })?;
        }
        self.capture.validate("capture")?;

        let mut seen = HashSet::new();
        let names = self
            .views
            .iter()
            .map(|view| (&view.name, &view.capture))
            .chain(self.remotes.iter().map(|remote| (&remote.id, &remote.capture)));
        for (name, overrides) in names {
            validate_target_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(ShotterError::configuration(format!(
                    "duplicate target name `{name}`"
                )));
            }
            self.capture.merged(overrides).validate(name)?;
        }
        for remote in &self.remotes {
            Url::parse(&remote.url).map_err(|err| {
                ShotterError::configuration(format!("{}: url `{}`: {err}", remote.id, remote.url))
            })?;
        }
        for name in &self.schedule.targets {
            if !seen.contains(name.as_str()) {
                return Err(ShotterError::configuration(format!(
                    "schedule.targets references unknown target `{name}`"
                )));
            }
        }
        Ok(())
    }

    pub fn retention_policy(&self) -> Result<RetentionPolicy, ShotterError> {
        RetentionPolicy::new(self.server.keep_count)
            .map_err(|err| ShotterError::configuration(err.to_string()))
    }

    /// Base URL views are resolved against.
    pub fn base_url(&self) -> Result<Url, ShotterError> {
        let raw = match &self.server.base_url {
            Some(base) => base.clone(),
            None => {
                let host = match self.server.host.as_str() {
                    "0.0.0.0" | "::" | "" => "127.0.0.1",
                    other => other,
                };
                format!("http://{host}:{}/", self.server.port)
            }
        };
        Url::parse(&raw)
            .map_err(|err| ShotterError::configuration(format!("base url `{raw}`: {err}")))
    }

    pub fn render_config(&self) -> RenderConfig {
        let mut render = RenderConfig::default();
        if let Some(executable) = &self.browser.executable {
            render.executable = executable.clone();
        }
        render.headless = self.browser.headless;
        render.no_sandbox = render.no_sandbox || self.browser.no_sandbox;
        render
    }

    pub fn websocket_url(&self) -> Result<Url, ShotterError> {
        let ha = &self.homeassistant;
        Ok(shotter_rpc_bridge::websocket_url(&ha.host, ha.port, ha.ssl)?)
    }
}

/// Target names become part of file names: no path or extension separators.
fn validate_target_name(name: &str) -> Result<(), ShotterError> {
    if name.trim().is_empty() {
        return Err(ShotterError::configuration("target names must not be empty"));
    }
    if name.contains(['/', '\\', '.']) {
        return Err(ShotterError::configuration(format!(
            "target name `{name}` must not contain '/', '\\' or '.'"
        )));
    }
    Ok(())
}
