use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Navigation completion signal awaited by [`crate::RenderPage::goto`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// The navigation was committed.
    Commit,
    /// `document.readyState` reached `interactive`.
    DomContentLoaded,
    /// `document.readyState` reached `complete`.
    Load,
    /// Loaded, and no new resources fetched for a quiet window.
    #[default]
    NetworkIdle,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Commit => "commit",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::Load => "load",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitUntil {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "commit" => Ok(WaitUntil::Commit),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "load" => Ok(WaitUntil::Load),
            "networkidle" => Ok(WaitUntil::NetworkIdle),
            other => Err(format!("unknown wait_until policy `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Per-capture browser context settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextOptions {
    pub device_scale: f64,
    pub viewport: Option<Viewport>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            device_scale: 1.0,
            viewport: None,
            timezone: None,
            locale: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policies() {
        for policy in [
            WaitUntil::Commit,
            WaitUntil::DomContentLoaded,
            WaitUntil::Load,
            WaitUntil::NetworkIdle,
        ] {
            assert_eq!(policy.as_str().parse::<WaitUntil>().unwrap(), policy);
        }
        assert_eq!("NetworkIdle".parse::<WaitUntil>().unwrap(), WaitUntil::NetworkIdle);
        assert!("idle".parse::<WaitUntil>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let value: WaitUntil = serde_json::from_str("\"domcontentloaded\"").unwrap();
        assert_eq!(value, WaitUntil::DomContentLoaded);
        assert_eq!(WaitUntil::default(), WaitUntil::NetworkIdle);
    }
}
