use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use render_adapter::RenderBackend;
use shotter_scheduler::{RepeatSummary, SchedulerError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::capture::{repeat_options, schedule_captures, select_targets, RoundTracker};
use crate::cli::context::CliContext;
use crate::server::{build_router, AppState, ServiceCaller};

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Bind address; overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Port; overrides server.port
    #[arg(long)]
    pub port: Option<u16>,

    /// Serve the API without running the capture schedule
    #[arg(long)]
    pub no_schedule: bool,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let targets: Arc<[_]> = ctx.targets()?.into();
    let browser = ctx.browser();
    let backend: Arc<dyn RenderBackend> = browser.clone();
    let orchestrator = Arc::new(ctx.orchestrator(backend)?);
    let services: Arc<dyn ServiceCaller> = Arc::new(ctx.bridge()?);
    let rounds = Arc::new(RoundTracker::new());

    let schedule = if args.no_schedule || targets.is_empty() {
        if targets.is_empty() {
            warn!("No views or remotes configured; the capture schedule is idle");
        }
        None
    } else {
        let scheduled: Arc<[_]> =
            select_targets(&targets, &config.schedule.targets).into();
        Some(tokio::spawn(schedule_captures(
            Arc::clone(&orchestrator),
            scheduled,
            repeat_options(&config.schedule),
            Arc::clone(&rounds),
        )))
    };

    let state = AppState::new(
        ctx.shared_config(),
        orchestrator,
        Arc::clone(&targets),
        services,
        rounds,
    );
    let router = build_router(state);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind API server on {addr}"))?;
    info!(%addr, targets = targets.len(), "API server listening");

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let result = supervise(server, schedule).await;
    browser.shutdown().await;
    result
}

type ScheduleHandle = JoinHandle<Result<RepeatSummary, SchedulerError>>;

/// Runs the API server until it stops, or until the schedule dies.
///
/// A schedule that stops on a failed round takes the server down with it
/// and the error is returned.
async fn supervise<S>(server: S, schedule: Option<ScheduleHandle>) -> Result<()>
where
    S: Future<Output = io::Result<()>>,
{
    let Some(mut schedule) = schedule else {
        return server.await.context("API server exited unexpectedly");
    };
    tokio::pin!(server);

    tokio::select! {
        served = &mut server => {
            schedule.abort();
            return served.context("API server exited unexpectedly");
        }
        finished = &mut schedule => match finished {
            Ok(Ok(summary)) => info!(?summary, "capture schedule finished"),
            Ok(Err(err)) => {
                error!(%err, "capture schedule stopped; shutting down");
                return Err(anyhow::Error::new(err).context("capture schedule failed"));
            }
            Err(err) => {
                error!(%err, "capture schedule task failed; shutting down");
                return Err(anyhow::Error::new(err).context("capture schedule task failed"));
            }
        },
    }

    server.await.context("API server exited unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
