use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shotter_capture_store::{CaptureFile, CaptureFormat, StoreErrKind, StoreError};
use shotter_capture_visual::{inspect, ImageDetails};
use tracing::info;

use crate::capture::{CaptureOutcome, CaptureTarget, TargetKind};
use crate::config::CaptureConfig;
use crate::errors::{ShotterError, ShotterResult};
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub(super) struct FormatQuery {
    format: Option<String>,
}

impl FormatQuery {
    fn parse(&self) -> ShotterResult<Option<CaptureFormat>> {
        self.format
            .as_deref()
            .map(CaptureFormat::from_str)
            .transpose()
            .map_err(ShotterError::from)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CaptureEntry {
    filename: String,
    name: String,
    timestamp: i64,
    format: CaptureFormat,
    datetime: Option<String>,
}

impl From<&CaptureFile> for CaptureEntry {
    fn from(file: &CaptureFile) -> Self {
        Self {
            filename: file.file_name(),
            name: file.name.clone(),
            timestamp: file.timestamp,
            format: file.format,
            datetime: file.datetime().map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CaptureDetails {
    #[serde(flatten)]
    entry: CaptureEntry,
    #[serde(flatten)]
    image: ImageDetails,
}

#[derive(Debug, Serialize)]
pub(super) struct TargetEntry {
    name: String,
    kind: TargetKind,
    url: String,
    capture: CaptureConfig,
    last_capture: Option<CaptureEntry>,
}

pub(super) async fn list_targets(
    State(state): State<AppState>,
) -> ShotterResult<Json<Vec<TargetEntry>>> {
    let store = state.orchestrator.store();
    let mut entries = Vec::with_capacity(state.targets.len());
    for target in state.targets.iter() {
        let last = store.latest(&target.name)?;
        entries.push(TargetEntry {
            name: target.name.clone(),
            kind: target.kind,
            url: target.url.to_string(),
            capture: target.capture.clone(),
            last_capture: last.as_ref().map(CaptureEntry::from),
        });
    }
    Ok(Json(entries))
}

pub(super) async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> ShotterResult<Json<Vec<CaptureEntry>>> {
    let format = query.parse()?;
    let files = state.orchestrator.store().list(None, format)?;
    Ok(Json(files.iter().map(CaptureEntry::from).collect()))
}

pub(super) async fn list_for_target(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<FormatQuery>,
) -> ShotterResult<Json<Vec<CaptureEntry>>> {
    let target = known_target(&state, &name)?;
    let format = query.parse()?;
    let files = state
        .orchestrator
        .store()
        .list(Some(&target.name), format)?;
    Ok(Json(files.iter().map(CaptureEntry::from).collect()))
}

pub(super) async fn details(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ShotterResult<Json<CaptureDetails>> {
    let file = state.orchestrator.store().find(&filename)?;
    Ok(Json(describe(&state, &file)?))
}

pub(super) async fn last_for_target(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ShotterResult<Json<CaptureDetails>> {
    let target = known_target(&state, &name)?;
    let file = state
        .orchestrator
        .store()
        .latest(&target.name)?
        .ok_or_else(|| {
            StoreError::new(StoreErrKind::NotFound(format!("no capture for '{}'", target.name)))
        })?;
    Ok(Json(describe(&state, &file)?))
}

pub(super) async fn capture_now(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ShotterResult<Json<CaptureOutcome>> {
    let target = known_target(&state, &name)?.clone();
    info!(target: "capture", name = %target.name, "on-demand capture requested");
    let outcome = state.orchestrator.capture_once(&target).await?;
    Ok(Json(outcome))
}

fn known_target<'a>(state: &'a AppState, name: &str) -> ShotterResult<&'a CaptureTarget> {
    state
        .target(name)
        .ok_or_else(|| ShotterError::UnknownTarget(name.to_string()))
}

fn describe(state: &AppState, file: &CaptureFile) -> ShotterResult<CaptureDetails> {
    let path = state.orchestrator.store().path_of(file);
    let image = inspect(&path, file.format)?;
    Ok(CaptureDetails {
        entry: CaptureEntry::from(file),
        image,
    })
}
