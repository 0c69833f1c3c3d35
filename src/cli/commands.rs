use clap::Subcommand;

use super::call::CallArgs;
use super::capture::CaptureArgs;
use super::list::ListArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the capture schedule and the HTTP API
    Serve(ServeArgs),

    /// Capture one target, or every target, once
    Capture(CaptureArgs),

    /// List persisted captures, newest first
    List(ListArgs),

    /// Invoke a Home Assistant service through the websocket bridge
    Call(CallArgs),

    /// Show version and build information
    Version,
}
