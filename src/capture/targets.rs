use serde::Serialize;
use url::Url;

use crate::config::{AppConfig, CaptureConfig};
use crate::errors::ShotterError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    View,
    Remote,
}

/// A page to capture, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureTarget {
    pub name: String,
    pub kind: TargetKind,
    pub url: Url,
    pub capture: CaptureConfig,
}

/// Resolves views then remotes, in configuration order.
///
/// View paths are joined relative to the base URL so a base with a path
/// prefix keeps it.
pub fn build_targets(config: &AppConfig) -> Result<Vec<CaptureTarget>, ShotterError> {
    let mut base = config.base_url()?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut targets = Vec::with_capacity(config.views.len() + config.remotes.len());
    for view in &config.views {
        let path = view
            .path
            .clone()
            .unwrap_or_else(|| format!("views/{}", view.name));
        let url = base.join(path.trim_start_matches('/')).map_err(|err| {
            ShotterError::configuration(format!("{}: view path `{path}`: {err}", view.name))
        })?;
        targets.push(CaptureTarget {
            name: view.name.clone(),
            kind: TargetKind::View,
            url,
            capture: config.capture.merged(&view.capture),
        });
    }
    for remote in &config.remotes {
        let url = Url::parse(&remote.url).map_err(|err| {
            ShotterError::configuration(format!("{}: url `{}`: {err}", remote.id, remote.url))
        })?;
        targets.push(CaptureTarget {
            name: remote.id.clone(),
            kind: TargetKind::Remote,
            url,
            capture: config.capture.merged(&remote.capture),
        });
    }
    Ok(targets)
}

/// Narrows `targets` to `names` (keeping configuration order); empty keeps all.
pub fn select_targets(targets: &[CaptureTarget], names: &[String]) -> Vec<CaptureTarget> {
    targets
        .iter()
        .filter(|target| names.is_empty() || names.iter().any(|n| *n == target.name))
        .cloned()
        .collect()
}
