use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, NavigateParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::handler::viewport::Viewport as BrowserViewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{ContextOptions, WaitUntil};
use crate::config::RenderConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::{RenderBackend, RenderPage};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Quiet window required before the network counts as idle.
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

const READY_STATE_PROBE: &str = "[document.readyState, location.href]";
const RESOURCE_COUNT_PROBE: &str = "performance.getEntriesByType('resource').length";

/// Chromium driven over the DevTools protocol.
///
/// The browser process is launched on first use and shared by every
/// capture; each page gets a throwaway browser context.
pub struct ChromiumBackend {
    cfg: RenderConfig,
    runtime: Mutex<Option<Arc<BrowserRuntime>>>,
}

struct BrowserRuntime {
    browser: Browser,
    handler: JoinHandle<()>,
    alive: Arc<AtomicBool>,
}

impl BrowserRuntime {
    async fn launch(cfg: &RenderConfig) -> Result<Self, AdapterError> {
        let config = browser_config(cfg)?;
        info!(
            target: "render-adapter",
            executable = %cfg.executable.display(),
            headless = cfg.headless,
            "launching browser"
        );
        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::BrowserUnavailable).with_hint(err.to_string())
        })?;

        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "render-adapter", ?err, "browser handler error");
                }
            }
            flag.store(false, Ordering::SeqCst);
            warn!(target: "render-adapter", "browser connection closed");
        });
        Ok(Self {
            browser,
            handler,
            alive,
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.handler.is_finished()
    }
}

impl Drop for BrowserRuntime {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn browser_config(cfg: &RenderConfig) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(AdapterError::new(AdapterErrorKind::BrowserUnavailable).with_hint(format!(
            "chrome executable not found at {}; set SHOTTER_CHROME to the full path of chrome/chromium",
            cfg.executable.display()
        )));
    }

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(cfg.request_timeout_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms))
        .viewport(None::<BrowserViewport>);

    if cfg.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }
    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }

    let mut args: Vec<String> = [
        "--disable-background-networking",
        "--disable-background-timer-throttling",
        "--disable-breakpad",
        "--disable-component-update",
        "--disable-default-apps",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-sync",
        "--hide-scrollbars",
        "--mute-audio",
        "--no-first-run",
        "--no-default-browser-check",
        "--password-store=basic",
        "--use-mock-keychain",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    args.extend(cfg.extra_args.iter().cloned());
    builder = builder.args(args);

    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(cfg.executable.clone());
    }

    builder.build().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("browser config error: {err}"))
    })
}

impl ChromiumBackend {
    pub fn new(cfg: RenderConfig) -> Self {
        Self {
            cfg,
            runtime: Mutex::new(None),
        }
    }

    async fn runtime(&self) -> Result<Arc<BrowserRuntime>, AdapterError> {
        let mut guard = self.runtime.lock().await;
        if let Some(runtime) = guard.as_ref() {
            if runtime.is_alive() {
                return Ok(Arc::clone(runtime));
            }
            warn!(target: "render-adapter", "browser exited, relaunching");
        }
        let runtime = Arc::new(BrowserRuntime::launch(&self.cfg).await?);
        *guard = Some(Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Closes the browser if no page still holds it.
    pub async fn shutdown(&self) {
        let Some(runtime) = self.runtime.lock().await.take() else {
            return;
        };
        match Arc::try_unwrap(runtime) {
            Ok(mut runtime) => {
                if let Err(err) = runtime.browser.close().await {
                    debug!(target: "render-adapter", ?err, "browser close failed");
                }
                let _ = runtime.browser.wait().await;
                info!(target: "render-adapter", "browser closed");
            }
            Err(_) => debug!(target: "render-adapter", "browser still in use, leaving it to drop"),
        }
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn open_page(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn RenderPage>, AdapterError> {
        let runtime = self.runtime().await?;
        let context_id = runtime
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = Some(context_id.clone());
        let page = match runtime.browser.new_page(params).await {
            Ok(page) => page,
            Err(err) => {
                dispose_context(&runtime, context_id).await;
                return Err(err.into());
            }
        };

        let mut handle = ChromiumPage {
            page: Some(page),
            context_id: Some(context_id),
            runtime,
        };
        if let Err(err) = handle.emulate(options).await {
            let _ = Box::new(handle).close().await;
            return Err(err);
        }
        Ok(Box::new(handle))
    }
}

async fn dispose_context(runtime: &BrowserRuntime, context_id: BrowserContextId) {
    if let Err(err) = runtime
        .browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        debug!(target: "render-adapter", ?err, "dispose browser context failed");
    }
}

struct ChromiumPage {
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
    runtime: Arc<BrowserRuntime>,
}

impl ChromiumPage {
    fn page(&self) -> Result<&Page, AdapterError> {
        self.page
            .as_ref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Internal).with_hint("page closed"))
    }

    async fn emulate(&mut self, options: &ContextOptions) -> Result<(), AdapterError> {
        let page = self.page()?;
        // A zero width/height keeps the window size and only overrides the scale.
        let (width, height) = options
            .viewport
            .map(|v| (i64::from(v.width), i64::from(v.height)))
            .unwrap_or((0, 0));
        page.execute(SetDeviceMetricsOverrideParams::new(
            width,
            height,
            options.device_scale,
            false,
        ))
        .await?;
        if let Some(timezone) = &options.timezone {
            page.execute(SetTimezoneOverrideParams::new(timezone.clone()))
                .await?;
        }
        if let Some(locale) = &options.locale {
            page.execute(SetLocaleOverrideParams {
                locale: Some(locale.clone()),
            })
            .await?;
        }
        Ok(())
    }

    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<(), AdapterError> {
        let page = self.page()?;
        let response = page.execute(NavigateParams::new(url)).await?;
        if let Some(error_text) = response.result.error_text.as_ref() {
            return Err(AdapterError::new(AdapterErrorKind::Navigation)
                .with_hint(format!("{error_text} at {url}")));
        }
        match wait_until {
            WaitUntil::Commit => Ok(()),
            WaitUntil::DomContentLoaded => self.wait_ready_state(url, &["interactive", "complete"]).await,
            WaitUntil::Load => self.wait_ready_state(url, &["complete"]).await,
            WaitUntil::NetworkIdle => {
                self.wait_ready_state(url, &["complete"]).await?;
                self.wait_network_quiet().await
            }
        }
    }

    async fn wait_ready_state(&self, url: &str, accepted: &[&str]) -> Result<(), AdapterError> {
        let page = self.page()?;
        let expect_blank = url.starts_with("about:blank");
        loop {
            let (state, href): (String, String) = page
                .evaluate(READY_STATE_PROBE)
                .await?
                .into_value()
                .map_err(|err| AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string()))?;
            // The initial about:blank document is already complete.
            let navigated = expect_blank || href != "about:blank";
            if navigated && accepted.contains(&state.as_str()) {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_network_quiet(&self) -> Result<(), AdapterError> {
        let page = self.page()?;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();
        loop {
            let count: u64 = page
                .evaluate(RESOURCE_COUNT_PROBE)
                .await?
                .into_value()
                .map_err(|err| AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string()))?;
            if last_count != Some(count) {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn goto(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), AdapterError> {
        debug!(target: "render-adapter", url, %wait_until, "navigating");
        match tokio::time::timeout(timeout, self.navigate(url, wait_until)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::timeout("navigation", timeout)),
        }
    }

    async fn screenshot(&mut self, path: &Path, timeout: Duration) -> Result<(), AdapterError> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let bytes = match tokio::time::timeout(timeout, page.screenshot(params)).await {
            Ok(result) => result?,
            Err(_) => return Err(AdapterError::timeout("screenshot", timeout)),
        };
        tokio::fs::write(path, bytes).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("write {}: {err}", path.display()))
        })?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<(), AdapterError> {
        let mut result = Ok(());
        if let Some(page) = self.page.take() {
            if let Err(err) = page.close().await {
                result = Err(AdapterError::from(err));
            }
        }
        if let Some(context_id) = self.context_id.take() {
            dispose_context(&self.runtime, context_id).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_browser_unavailable() {
        let cfg = RenderConfig {
            executable: "/nonexistent/chrome".into(),
            ..RenderConfig::default()
        };
        let err = browser_config(&cfg).unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::BrowserUnavailable);
        assert!(err.to_string().contains("/nonexistent/chrome"));
    }

    #[tokio::test]
    async fn launch_failure_surfaces_from_open_page() {
        let backend = ChromiumBackend::new(RenderConfig {
            executable: "/nonexistent/chrome".into(),
            ..RenderConfig::default()
        });
        let err = match backend.open_page(&ContextOptions::default()).await {
            Ok(_) => panic!("launch must fail"),
            Err(err) => err,
        };
        assert_eq!(err.kind, AdapterErrorKind::BrowserUnavailable);
        backend.shutdown().await;
    }
}
