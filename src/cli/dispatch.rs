use super::call::cmd_call;
use super::capture::cmd_capture;
use super::list::cmd_list;
use super::serve::cmd_serve;
use super::version::cmd_version;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(command: Commands, ctx: &CliContext) -> Result<()> {
    match command {
        Commands::Serve(args) => cmd_serve(args, ctx).await,
        Commands::Capture(args) => cmd_capture(args, ctx).await,
        Commands::List(args) => cmd_list(args, ctx).await,
        Commands::Call(args) => cmd_call(args, ctx).await,
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}
