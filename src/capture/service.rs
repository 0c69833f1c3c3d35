use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use shotter_scheduler::{repeat_every, RepeatOptions, RepeatSummary, SchedulerError};
use tracing::{error, info};

use super::orchestrator::{CaptureOrchestrator, CaptureOutcome};
use super::targets::CaptureTarget;
use crate::config::ScheduleSettings;
use crate::errors::ShotterError;

/// Captures every target in order.
///
/// A failing target does not stop the round; the first error is returned
/// once all targets were attempted.
pub async fn capture_all(
    orchestrator: &CaptureOrchestrator,
    targets: &[CaptureTarget],
) -> Result<Vec<CaptureOutcome>, ShotterError> {
    let mut outcomes = Vec::with_capacity(targets.len());
    let mut first_error = None;
    for target in targets {
        match orchestrator.capture_once(target).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                error!(target: "capture", name = %target.name, %err, "capture failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => {
            info!(target: "capture", count = outcomes.len(), "capture round complete");
            Ok(outcomes)
        }
    }
}

pub fn repeat_options(settings: &ScheduleSettings) -> RepeatOptions {
    RepeatOptions::every(settings.interval_duration())
        .wait_first(settings.wait_first)
        .raise_exceptions(settings.raise_exceptions)
}

/// Outcome of the latest scheduled rounds, read by the health endpoint.
#[derive(Debug, Default)]
pub struct RoundTracker {
    rounds: AtomicU64,
    failures: AtomicU64,
    last_round_at: AtomicI64,
    last_error: Mutex<Option<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub rounds: u64,
    pub failures: u64,
    pub last_round_at: Option<i64>,
    pub last_error: Option<String>,
}

impl RoundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T>(&self, result: &Result<T, ShotterError>) {
        self.rounds.fetch_add(1, Ordering::SeqCst);
        self.last_round_at
            .store(Utc::now().timestamp(), Ordering::SeqCst);
        let error = match result {
            Ok(_) => None,
            Err(err) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                Some(err.to_string())
            }
        };
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = error;
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            rounds: self.rounds.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            last_round_at: match self.last_round_at.load(Ordering::SeqCst) {
                0 => None,
                ts => Some(ts),
            },
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }
}

/// Runs [`capture_all`] over `targets` on the scheduler's cadence, recording
/// each round in `tracker`.
pub async fn schedule_captures(
    orchestrator: Arc<CaptureOrchestrator>,
    targets: Arc<[CaptureTarget]>,
    options: RepeatOptions,
    tracker: Arc<RoundTracker>,
) -> Result<RepeatSummary, SchedulerError> {
    info!(
        target: "capture",
        targets = targets.len(),
        interval_s = options.interval.as_secs(),
        wait_first = options.wait_first,
        "starting capture schedule"
    );
    repeat_every(options, move || {
        let orchestrator = Arc::clone(&orchestrator);
        let targets = Arc::clone(&targets);
        let tracker = Arc::clone(&tracker);
        async move {
            let result = capture_all(&orchestrator, &targets).await;
            tracker.record(&result);
            result.map(|_| ())
        }
    })
    .await
}
