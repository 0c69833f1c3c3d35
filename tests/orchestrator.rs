use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use render_adapter::{
    AdapterError, AdapterErrorKind, ContextOptions, RenderBackend, RenderPage, UnavailableBackend,
    WaitUntil,
};
use shotter_capture_store::{CaptureFile, CaptureFormat, CaptureStore, RetentionPolicy};
use shotter_capture_visual::{inspect, FallbackAssets};
use shotter_cli::capture::{
    capture_all, CaptureOrchestrator, CaptureStatus, CaptureTarget, TargetKind,
};
use shotter_cli::config::CaptureConfig;
use tempfile::TempDir;
use url::Url;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    /// Writes a solid red snapshot, then takes a while to close.
    SucceedRedSlowClose,
    NavigationTimeout,
    NavigationFails,
    SkipScreenshot,
}

type EventLog = Arc<Mutex<Vec<String>>>;

struct FakeBackend {
    behavior: Behavior,
    /// Per-page behaviors consumed in open order before `behavior` applies.
    script: Mutex<VecDeque<Behavior>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    events: EventLog,
}

impl FakeBackend {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            script: Mutex::new(VecDeque::new()),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn scripted(pages: impl IntoIterator<Item = Behavior>) -> Self {
        let backend = Self::new(Behavior::Succeed);
        backend.script.lock().unwrap().extend(pages);
        backend
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderBackend for FakeBackend {
    async fn open_page(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn RenderPage>, AdapterError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.behavior);
        let (width, height) = options
            .viewport
            .map(|viewport| (viewport.width, viewport.height))
            .unwrap_or((120, 80));
        Ok(Box::new(FakePage {
            behavior,
            width,
            height,
            closed: Arc::clone(&self.closed),
            events: Arc::clone(&self.events),
        }))
    }
}

struct FakePage {
    behavior: Behavior,
    width: u32,
    height: u32,
    closed: Arc<AtomicUsize>,
    events: EventLog,
}

impl FakePage {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl RenderPage for FakePage {
    async fn goto(
        &mut self,
        _url: &str,
        _wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), AdapterError> {
        self.record("goto");
        match self.behavior {
            Behavior::NavigationTimeout => Err(AdapterError::timeout("navigation", timeout)),
            Behavior::NavigationFails => Err(AdapterError::new(AdapterErrorKind::Navigation)
                .with_hint("net::ERR_CONNECTION_REFUSED")),
            _ => Ok(()),
        }
    }

    async fn wait_ms(&mut self, ms: u64) {
        self.record(format!("wait_ms({ms})"));
    }

    async fn screenshot(&mut self, path: &Path, _timeout: Duration) -> Result<(), AdapterError> {
        self.record("screenshot");
        let img = match self.behavior {
            Behavior::SkipScreenshot => return Ok(()),
            Behavior::SucceedRedSlowClose => {
                RgbImage::from_pixel(self.width, self.height, Rgb([255, 0, 0]))
            }
            _ => RgbImage::from_fn(self.width, self.height, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, 200])
            }),
        };
        img.save(path)
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), AdapterError> {
        if matches!(self.behavior, Behavior::SucceedRedSlowClose) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        self.record("close");
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn target(name: &str, capture: CaptureConfig) -> CaptureTarget {
    CaptureTarget {
        name: name.to_string(),
        kind: TargetKind::View,
        url: Url::parse(&format!("http://127.0.0.1:8123/{name}")).unwrap(),
        capture,
    }
}

fn orchestrator(backend: Arc<dyn RenderBackend>, root: &Path, keep: usize) -> CaptureOrchestrator {
    let store = CaptureStore::new(root, RetentionPolicy::new(keep).unwrap());
    let assets = Arc::new(FallbackAssets::embedded().unwrap());
    CaptureOrchestrator::new(backend, store, assets)
}

fn sized(width: u32, height: u32) -> CaptureConfig {
    CaptureConfig {
        width: Some(width),
        height: Some(height),
        timeout: 750,
        ..CaptureConfig::default()
    }
}

#[tokio::test]
async fn successful_render_is_persisted() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::new(Behavior::Succeed));
    let orch = orchestrator(backend.clone(), dir.path(), 5);

    let outcome = orch.capture_once(&target("kitchen", sized(64, 48))).await.unwrap();

    assert_eq!(outcome.status, CaptureStatus::Captured);
    assert!(outcome.path.is_file());
    assert_eq!(outcome.file.name, "kitchen");
    assert_eq!(outcome.file.format, CaptureFormat::Png);
    let saved = image::open(&outcome.path).unwrap();
    assert_eq!((saved.width(), saved.height()), (64, 48));
    assert!(!orch.store().staging_path().exists());
    assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
    assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn navigation_timeout_yields_annotated_fallback() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::new(Behavior::NavigationTimeout));
    let orch = orchestrator(backend.clone(), dir.path(), 5);

    let outcome = orch.capture_once(&target("hall", sized(200, 100))).await.unwrap();

    assert_eq!(
        outcome.status,
        CaptureStatus::Fallback {
            reason: "Timeout (750 ms.)".to_string()
        }
    );
    let saved = image::open(&outcome.path).unwrap();
    assert_eq!((saved.width(), saved.height()), (200, 100));
    // The page is released even when navigation fails.
    assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn navigation_error_message_is_the_reason() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        Arc::new(FakeBackend::new(Behavior::NavigationFails)),
        dir.path(),
        5,
    );

    let outcome = orch.capture_once(&target("porch", sized(80, 60))).await.unwrap();

    match outcome.status {
        CaptureStatus::Fallback { reason } => {
            assert!(reason.contains("ERR_CONNECTION_REFUSED"), "{reason}")
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(outcome.path.is_file());
}

#[tokio::test]
async fn missing_snapshot_falls_back() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        Arc::new(FakeBackend::new(Behavior::SkipScreenshot)),
        dir.path(),
        5,
    );

    let outcome = orch.capture_once(&target("den", sized(80, 60))).await.unwrap();

    assert!(outcome.status.is_fallback());
    assert!(outcome.path.is_file());
}

#[tokio::test]
async fn unavailable_browser_still_produces_a_file() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        Arc::new(UnavailableBackend::new("no chrome installed")),
        dir.path(),
        5,
    );

    let outcome = orch.capture_once(&target("garage", CaptureConfig::default())).await.unwrap();

    match &outcome.status {
        CaptureStatus::Fallback { reason } => assert!(reason.contains("no chrome installed")),
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(outcome.path.is_file());
}

#[tokio::test]
async fn stale_staging_file_is_not_reused() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        Arc::new(FakeBackend::new(Behavior::SkipScreenshot)),
        dir.path(),
        5,
    );
    orch.store().ensure_root().unwrap();
    RgbImage::new(10, 10).save(orch.store().staging_path()).unwrap();

    let outcome = orch.capture_once(&target("attic", sized(40, 30))).await.unwrap();

    assert!(outcome.status.is_fallback());
}

#[tokio::test]
async fn retention_keeps_newest_per_stream() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(Arc::new(FakeBackend::new(Behavior::Succeed)), dir.path(), 3);
    orch.store().ensure_root().unwrap();
    for ts in 1..=4 {
        let old = CaptureFile::new(ts, "kitchen", CaptureFormat::Png);
        orch.store().persist(&old, b"old").unwrap();
    }
    let other = CaptureFile::new(1, "hall", CaptureFormat::Png);
    orch.store().persist(&other, b"old").unwrap();

    let outcome = orch.capture_once(&target("kitchen", sized(32, 32))).await.unwrap();

    let kept = orch.store().list(Some("kitchen"), None).unwrap();
    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0], outcome.file);
    assert_eq!(kept[1].timestamp, 4);
    assert_eq!(kept[2].timestamp, 3);
    assert_eq!(orch.store().list(Some("hall"), None).unwrap().len(), 1);
}

#[tokio::test]
async fn palette_and_bmp_outputs() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(Arc::new(FakeBackend::new(Behavior::Succeed)), dir.path(), 5);

    let indexed = orch
        .capture_once(&target(
            "eink",
            CaptureConfig {
                bit_depth: Some(16),
                grayscale: true,
                ..sized(60, 40)
            },
        ))
        .await
        .unwrap();
    let details = inspect(&indexed.path, CaptureFormat::Png).unwrap();
    assert_eq!(details.mode, "P");
    assert!(details.palette_size.unwrap() <= 16);

    let bmp = orch
        .capture_once(&target(
            "lcd",
            CaptureConfig {
                format: CaptureFormat::Bmp,
                ..sized(60, 40)
            },
        ))
        .await
        .unwrap();
    assert_eq!(bmp.file.format, CaptureFormat::Bmp);
    assert!(bmp.path.extension().is_some_and(|ext| ext == "bmp"));
    assert_eq!(
        image::guess_format(&std::fs::read(&bmp.path).unwrap()).unwrap(),
        image::ImageFormat::Bmp
    );
}

#[tokio::test]
async fn capture_all_covers_every_target() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::new(Behavior::Succeed));
    let orch = orchestrator(backend.clone(), dir.path(), 5);
    let targets = vec![target("one", sized(20, 20)), target("two", sized(20, 20))];

    let outcomes = capture_all(&orch, &targets).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
    assert_eq!(orch.store().list(None, None).unwrap().len(), 2);
}

#[tokio::test]
async fn configured_delay_runs_between_navigation_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::new(Behavior::Succeed));
    let orch = orchestrator(backend.clone(), dir.path(), 5);

    let delayed = CaptureConfig {
        delay: Some(1500),
        ..sized(40, 30)
    };
    orch.capture_once(&target("clock", delayed)).await.unwrap();
    assert_eq!(
        backend.events(),
        vec!["goto", "wait_ms(1500)", "screenshot", "close"]
    );

    backend.events.lock().unwrap().clear();
    orch.capture_once(&target("clock", sized(40, 30))).await.unwrap();
    assert_eq!(backend.events(), vec!["goto", "screenshot", "close"]);
}

#[tokio::test]
async fn concurrent_captures_do_not_share_snapshots() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::scripted([
        Behavior::SucceedRedSlowClose,
        Behavior::NavigationTimeout,
    ]));
    let orch = orchestrator(backend.clone(), dir.path(), 5);
    let red = target("red", sized(300, 200));
    let stalled = target("stalled", sized(300, 200));

    let (red_outcome, stalled_outcome) =
        tokio::join!(orch.capture_once(&red), orch.capture_once(&stalled));
    let red_outcome = red_outcome.unwrap();
    let stalled_outcome = stalled_outcome.unwrap();

    assert_eq!(red_outcome.status, CaptureStatus::Captured);
    let saved = image::open(&red_outcome.path).unwrap().to_rgb8();
    assert_eq!(*saved.get_pixel(150, 150), Rgb([255, 0, 0]));

    assert_eq!(
        stalled_outcome.status,
        CaptureStatus::Fallback {
            reason: "Timeout (750 ms.)".to_string()
        }
    );

    // The second page is only opened once the first capture finished.
    assert_eq!(
        backend.events(),
        vec!["goto", "screenshot", "close", "goto", "close"]
    );
}
