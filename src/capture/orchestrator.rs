use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use image::DynamicImage;
use render_adapter::{AdapterError, ContextOptions, RenderBackend, RenderPage, Viewport};
use serde::Serialize;
use shotter_capture_store::fs::writer::remove_file;
use shotter_capture_store::{CaptureFile, CaptureStore};
use shotter_capture_visual::{
    encode, generate_fallback, EncodeOptions, FallbackAssets, PostProcess,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::targets::CaptureTarget;
use crate::config::CaptureConfig;
use crate::errors::ShotterError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaptureStatus {
    Captured,
    /// The placeholder was persisted instead; `reason` is drawn on it.
    Fallback { reason: String },
}

impl CaptureStatus {
    pub fn is_fallback(&self) -> bool {
        matches!(self, CaptureStatus::Fallback { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CaptureOutcome {
    pub file: CaptureFile,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: CaptureStatus,
}

/// Drives one capture end to end: render, post-process, persist, sweep.
///
/// Rendering problems never escape [`CaptureOrchestrator::capture_once`];
/// they turn into an annotated placeholder image. Only store and image
/// failures are returned as errors.
///
/// Captures are serialized: the staging file and the browser page belong to
/// one capture at a time.
pub struct CaptureOrchestrator {
    backend: Arc<dyn RenderBackend>,
    store: CaptureStore,
    assets: Arc<FallbackAssets>,
    timezone: Option<String>,
    locale: Option<String>,
    run_lock: Mutex<()>,
}

impl CaptureOrchestrator {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        store: CaptureStore,
        assets: Arc<FallbackAssets>,
    ) -> Self {
        Self {
            backend,
            store,
            assets,
            timezone: None,
            locale: None,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_timezone(mut self, timezone: Option<String>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    pub async fn capture_once(&self, target: &CaptureTarget) -> Result<CaptureOutcome, ShotterError> {
        let _running = self.run_lock.lock().await;
        self.store.ensure_root()?;
        let staging = self.store.staging_path();
        // A leftover from an interrupted run must not pass for this snapshot.
        remove_file(&staging).map_err(shotter_capture_store::StoreError::from)?;

        info!(target: "capture", name = %target.name, url = %target.url, "capturing");
        let render_result = self.render(target, &staging).await;

        let staged = staging.is_file();
        debug!(target: "capture", name = %target.name, staged, "render finished");
        let reason = match render_result {
            Err(reason) if !staged => Some(reason),
            _ if !staged => Some("Snapshot was not written".to_string()),
            _ => None,
        };

        let capture = target.capture.clone();
        let assets = Arc::clone(&self.assets);
        let staging_for_task = staging.clone();
        let (bytes, status) = tokio::task::spawn_blocking(move || {
            build_image(&assets, &capture, &staging_for_task, reason)
        })
        .await
        .map_err(|err| ShotterError::Internal(format!("image task failed: {err}")))??;

        let file = CaptureFile::new(Utc::now().timestamp(), &target.name, target.capture.format);
        let path = self.store.persist(&file, &bytes)?;
        info!(
            target: "capture",
            name = %target.name,
            file = %file,
            fallback = status.is_fallback(),
            "capture saved"
        );

        match self.store.sweep() {
            Ok(report) => debug!(
                target: "capture",
                removed = report.removed_count(),
                staging_removed = report.staging_removed,
                "retention applied"
            ),
            Err(err) => error!(target: "capture", ?err, "retention sweep failed"),
        }

        Ok(CaptureOutcome { file, path, status })
    }

    /// Renders `target` into `staging`; the error is the fallback message.
    async fn render(&self, target: &CaptureTarget, staging: &Path) -> Result<(), String> {
        let capture = &target.capture;
        let options = ContextOptions {
            device_scale: capture.scale,
            viewport: capture
                .size()
                .map(|(width, height)| Viewport { width, height }),
            timezone: self.timezone.clone(),
            locale: self.locale.clone(),
        };

        let mut page = match self.backend.open_page(&options).await {
            Ok(page) => page,
            Err(err) => {
                error!(target: "capture", name = %target.name, %err, "could not open a browser page");
                return Err(err.to_string());
            }
        };

        let result = drive_page(page.as_mut(), target, staging).await;
        if let Err(err) = page.close().await {
            warn!(target: "capture", name = %target.name, %err, "closing the page failed");
        }

        result.map_err(|err| {
            if err.is_timeout() {
                warn!(target: "capture", name = %target.name, %err, "render timed out");
                format!("Timeout ({} ms.)", capture.timeout)
            } else {
                error!(target: "capture", name = %target.name, %err, "render failed");
                err.to_string()
            }
        })
    }
}

async fn drive_page(
    page: &mut dyn RenderPage,
    target: &CaptureTarget,
    staging: &Path,
) -> Result<(), AdapterError> {
    let capture = &target.capture;
    let timeout = capture.timeout_duration();
    page.goto(target.url.as_str(), capture.wait_until, timeout).await?;
    if let Some(delay) = capture.delay {
        debug!(target: "capture", name = %target.name, delay_ms = delay, "delaying snapshot");
        page.wait_ms(delay).await;
    }
    page.screenshot(staging, timeout).await
}

/// Decodes the staged snapshot (or draws the placeholder), then
/// post-processes and encodes it.
fn build_image(
    assets: &FallbackAssets,
    capture: &CaptureConfig,
    staging: &Path,
    reason: Option<String>,
) -> Result<(Vec<u8>, CaptureStatus), ShotterError> {
    let (image, status) = match reason {
        None => match image::open(staging) {
            Ok(image) => (image, CaptureStatus::Captured),
            Err(err) => {
                error!(target: "capture", ?err, "staged snapshot is unreadable");
                fallback(assets, capture, err.to_string())
            }
        },
        Some(reason) => fallback(assets, capture, reason),
    };

    let image = PostProcess {
        invert: capture.invert,
        grayscale: capture.grayscale,
        resize: capture.size(),
    }
    .apply(image);

    let bytes = encode(
        &image,
        &EncodeOptions {
            format: capture.format,
            palette_colors: capture.bit_depth,
        },
    )?;
    Ok((bytes, status))
}

fn fallback(
    assets: &FallbackAssets,
    capture: &CaptureConfig,
    reason: String,
) -> (DynamicImage, CaptureStatus) {
    let image = generate_fallback(assets, capture.size(), Some(&reason));
    (image, CaptureStatus::Fallback { reason })
}
