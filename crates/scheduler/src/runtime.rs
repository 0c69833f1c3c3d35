use std::error::Error;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{BoxError, SchedulerError};
use crate::model::{RepeatOptions, RepeatSummary};

/// Runs `unit_of_work` repeatedly, sleeping `options.interval` after every
/// execution.
///
/// Execution time is not subtracted from the interval. A failed execution is
/// logged (when enabled) and either ends the loop with
/// [`SchedulerError::Fatal`] or is swallowed, per `raise_exceptions`. Without
/// `max_repetitions` this only returns on a fatal failure.
pub async fn repeat_every<F, Fut, E>(
    options: RepeatOptions,
    mut unit_of_work: F,
) -> Result<RepeatSummary, SchedulerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Into<BoxError>,
{
    if options.interval.is_zero() {
        return Err(SchedulerError::InvalidInterval);
    }

    let mut summary = RepeatSummary::default();
    if options.wait_first {
        debug!(target: "scheduler", interval_ms = options.interval.as_millis() as u64, "waiting before first run");
        tokio::time::sleep(options.interval).await;
    }

    while options
        .max_repetitions
        .map_or(true, |limit| summary.executions < limit)
    {
        summary.executions += 1;
        let execution = summary.executions;
        debug!(target: "scheduler", execution, "running unit of work");

        if let Err(err) = unit_of_work().await {
            let err: BoxError = err.into();
            summary.failures += 1;
            if options.log_errors {
                error!(
                    target: "scheduler",
                    execution,
                    error = %error_chain(err.as_ref()),
                    "unit of work failed"
                );
            }
            if options.raise_exceptions {
                return Err(SchedulerError::Fatal {
                    execution,
                    source: err,
                });
            }
        }

        if options
            .max_repetitions
            .is_some_and(|limit| summary.executions >= limit)
        {
            break;
        }
        tokio::time::sleep(options.interval).await;
    }
    Ok(summary)
}

/// Spawns [`repeat_every`] on the current runtime.
pub fn spawn_repeating<F, Fut, E>(
    options: RepeatOptions,
    unit_of_work: F,
) -> JoinHandle<Result<RepeatSummary, SchedulerError>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    tokio::spawn(repeat_every(options, unit_of_work))
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
