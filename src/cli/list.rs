use anyhow::Result;
use clap::Args;
use shotter_capture_store::CaptureFormat;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Only captures of this target
    #[arg(long)]
    pub target: Option<String>,

    /// Only captures in this format (png or bmp)
    #[arg(long)]
    pub format: Option<CaptureFormat>,
}

pub async fn cmd_list(args: ListArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.store()?;
    let captures = store.list(args.target.as_deref(), args.format)?;
    if captures.is_empty() {
        println!("No captures in {}", store.root().display());
        return Ok(());
    }
    for capture in captures {
        let when = capture
            .datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!("{when}  {:<16} {}", capture.name, capture.file_name());
    }
    Ok(())
}
