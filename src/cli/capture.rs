use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use render_adapter::RenderBackend;

use crate::capture::{capture_all, CaptureStatus};
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct CaptureArgs {
    /// Target to capture; every configured target when omitted
    pub target: Option<String>,
}

pub async fn cmd_capture(args: CaptureArgs, ctx: &CliContext) -> Result<()> {
    let mut targets = ctx.targets()?;
    if let Some(name) = &args.target {
        targets.retain(|target| &target.name == name);
        if targets.is_empty() {
            bail!("target '{name}' is not configured");
        }
    }
    if targets.is_empty() {
        bail!("no views or remotes configured in {}", ctx.config_path().display());
    }

    let browser = ctx.browser();
    let backend: Arc<dyn RenderBackend> = browser.clone();
    let orchestrator = ctx.orchestrator(backend)?;
    let result = capture_all(&orchestrator, &targets).await;
    browser.shutdown().await;

    for outcome in result? {
        match &outcome.status {
            CaptureStatus::Captured => println!("{}", outcome.path.display()),
            CaptureStatus::Fallback { reason } => {
                println!("{} (fallback: {reason})", outcome.path.display())
            }
        }
    }
    Ok(())
}
