use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shotter_scheduler::{repeat_every, spawn_repeating, RepeatOptions, SchedulerError};
use tokio::time::Instant;

fn recorder() -> (Arc<Mutex<Vec<Duration>>>, Instant) {
    (Arc::new(Mutex::new(Vec::new())), Instant::now())
}

#[tokio::test(start_paused = true)]
async fn runs_on_fixed_cadence() {
    let (stamps, start) = recorder();
    let sink = Arc::clone(&stamps);
    let summary = repeat_every(
        RepeatOptions::every(Duration::from_secs(5)).max_repetitions(3),
        move || {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(start.elapsed());
                Ok::<(), io::Error>(())
            }
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.executions, 3);
    assert_eq!(summary.failures, 0);
    let secs: Vec<u64> = stamps.lock().unwrap().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![0, 5, 10]);
}

#[tokio::test(start_paused = true)]
async fn wait_first_delays_first_run() {
    let (stamps, start) = recorder();
    let sink = Arc::clone(&stamps);
    repeat_every(
        RepeatOptions::every(Duration::from_secs(5))
            .wait_first(true)
            .max_repetitions(2),
        move || {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(start.elapsed());
                Ok::<(), io::Error>(())
            }
        },
    )
    .await
    .unwrap();

    let secs: Vec<u64> = stamps.lock().unwrap().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![5, 10]);
}

#[tokio::test(start_paused = true)]
async fn execution_time_is_not_subtracted() {
    let (stamps, start) = recorder();
    let sink = Arc::clone(&stamps);
    repeat_every(
        RepeatOptions::every(Duration::from_secs(5)).max_repetitions(3),
        move || {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(start.elapsed());
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok::<(), io::Error>(())
            }
        },
    )
    .await
    .unwrap();

    let secs: Vec<u64> = stamps.lock().unwrap().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![0, 7, 14]);
}

#[tokio::test(start_paused = true)]
async fn fatal_failure_stops_the_loop() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);
    let err = repeat_every(
        RepeatOptions::every(Duration::from_secs(5)).raise_exceptions(true),
        move || {
            let counter = Arc::clone(&counter);
            async move {
                let mut calls = counter.lock().unwrap();
                *calls += 1;
                if *calls == 2 {
                    Err(io::Error::new(io::ErrorKind::Other, "dashboard unreachable"))
                } else {
                    Ok(())
                }
            }
        },
    )
    .await
    .unwrap_err();

    assert_eq!(*calls.lock().unwrap(), 2);
    match err {
        SchedulerError::Fatal { execution, source } => {
            assert_eq!(execution, 2);
            assert_eq!(source.to_string(), "dashboard unreachable");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn swallowed_failures_keep_repeating() {
    let summary = repeat_every(
        RepeatOptions::every(Duration::from_secs(1))
            .log_errors(false)
            .max_repetitions(4),
        || async { Err::<(), _>(io::Error::new(io::ErrorKind::Other, "boom")) },
    )
    .await
    .unwrap();
    assert_eq!(summary.executions, 4);
    assert_eq!(summary.failures, 4);
}

#[tokio::test(start_paused = true)]
async fn limit_counts_failures_and_skips_the_final_sleep() {
    let start = Instant::now();
    let mut calls = 0u32;
    let summary = repeat_every(
        RepeatOptions::every(Duration::from_secs(5))
            .log_errors(false)
            .max_repetitions(3),
        || {
            calls += 1;
            let fail = calls == 2;
            async move {
                if fail {
                    Err(io::Error::other("flaky"))
                } else {
                    Ok(())
                }
            }
        },
    )
    .await
    .unwrap();
    assert_eq!(summary.executions, 3);
    assert_eq!(summary.failures, 1);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let err = repeat_every(RepeatOptions::every(Duration::ZERO), || async {
        Ok::<(), io::Error>(())
    })
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidInterval));
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_can_be_aborted() {
    let handle = spawn_repeating(RepeatOptions::every(Duration::from_secs(60)), || async {
        Ok::<(), io::Error>(())
    });
    tokio::time::sleep(Duration::from_secs(120)).await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}
