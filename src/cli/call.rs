use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use shotter_rpc_bridge::ServiceCall;

use crate::cli::context::CliContext;
use crate::server::SERVICE_CALL_DEADLINE;

#[derive(Args, Clone, Debug)]
pub struct CallArgs {
    /// Service domain, e.g. `light`
    pub domain: String,

    /// Service name, e.g. `turn_on`
    pub service: String,

    /// Target selector as JSON, e.g. '{"entity_id": "light.kitchen"}'
    #[arg(long, value_name = "JSON")]
    pub target: Option<String>,

    /// Service data as JSON
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,

    /// Give up after this many milliseconds
    #[arg(long, default_value_t = SERVICE_CALL_DEADLINE.as_millis() as u64)]
    pub deadline_ms: u64,
}

pub async fn cmd_call(args: CallArgs, ctx: &CliContext) -> Result<()> {
    let target = parse_json("--target", args.target.as_deref())?;
    let data = parse_json("--data", args.data.as_deref())?;
    let call = ServiceCall::new(args.domain, args.service)
        .with_target(target)
        .with_service_data(data);

    let bridge = ctx.bridge()?;
    let response = bridge
        .call_service_with_deadline(&call, Duration::from_millis(args.deadline_ms))
        .await
        .with_context(|| format!("{}.{} failed", call.domain, call.service))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn parse_json(flag: &str, raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON")),
        None => Ok(Value::Null),
    }
}
