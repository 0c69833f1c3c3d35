//! Contract tests against a real Chromium binary. Ignored by default because
//! they need Chrome/Chromium on the host.

use std::env;
use std::time::Duration;

use render_adapter::{
    ChromiumBackend, ContextOptions, RenderBackend, RenderConfig, Viewport, WaitUntil,
};

fn contract_enabled() -> bool {
    env::var("SHOTTER_RENDER_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SHOTTER_RENDER_CONTRACT=1 and SHOTTER_CHROME"]
async fn contract_screenshot_data_url() {
    if !contract_enabled() {
        eprintln!("skipping render contract test (SHOTTER_RENDER_CONTRACT not enabled)");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let backend = ChromiumBackend::new(RenderConfig::default());
    let options = ContextOptions {
        device_scale: 2.0,
        viewport: Some(Viewport {
            width: 320,
            height: 200,
        }),
        timezone: Some("Europe/Paris".into()),
        locale: Some("fr-FR".into()),
    };
    let mut page = backend.open_page(&options).await.expect("open page");
    page.goto(
        "data:text/html,<h1 style='color:red'>shotter</h1>",
        WaitUntil::NetworkIdle,
        Duration::from_secs(15),
    )
    .await
    .expect("navigate");
    page.wait_ms(50).await;

    let path = dir.path().join("shot.png");
    page.screenshot(&path, Duration::from_secs(10))
        .await
        .expect("screenshot");
    page.close().await.expect("close");

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
    backend.shutdown().await;
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SHOTTER_RENDER_CONTRACT=1 and SHOTTER_CHROME"]
async fn contract_unreachable_host_is_not_a_timeout() {
    if !contract_enabled() {
        eprintln!("skipping render contract test (SHOTTER_RENDER_CONTRACT not enabled)");
        return;
    }

    let backend = ChromiumBackend::new(RenderConfig::default());
    let mut page = backend
        .open_page(&ContextOptions::default())
        .await
        .expect("open page");
    let err = page
        .goto(
            "http://127.0.0.1:9/",
            WaitUntil::Load,
            Duration::from_secs(10),
        )
        .await
        .expect_err("connection refused");
    assert!(!err.is_timeout());
    page.close().await.expect("close");
    backend.shutdown().await;
}
