//! Tests for band loop scheduling, isolation and shutdown

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

use common::{HangingBandFetcher, RecordingSink, ScriptedFetcher};
use wsprpoll::band::Band;
use wsprpoll::dedup::MemoryDedupStore;
use wsprpoll::poller::RunnerTuning;
use wsprpoll::scheduler::Scheduler;

fn fast_tuning() -> RunnerTuning {
    RunnerTuning {
        min_request_interval: Duration::from_millis(10),
        quiet_cooldown: Duration::from_millis(20),
        error_cooldown: Duration::from_millis(20),
        ..RunnerTuning::default()
    }
}

#[tokio::test]
async fn test_cancellation_during_cooldown_stops_promptly() {
    let tuning = RunnerTuning {
        // Long enough that shutdown always lands inside the cooldown.
        quiet_cooldown: Duration::from_secs(30),
        ..RunnerTuning::default()
    };
    let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
    let scheduler = Scheduler::new(
        fetcher.clone(),
        Arc::new(MemoryDedupStore::new()),
        Arc::new(RecordingSink::new()),
        tuning,
        Duration::ZERO,
    )
    .with_bands(vec![Band::M40]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(true).unwrap();

    timeout(Duration::from_secs(1), handle)
        .await
        .expect("band loop must exit during its cooldown sleep")
        .unwrap();

    assert_eq!(fetcher.calls(), 1, "no further fetch after cancellation");
}

#[tokio::test]
async fn test_slow_band_does_not_block_others() {
    let fetcher = Arc::new(HangingBandFetcher::new(Band::M40));
    let scheduler = Scheduler::new(
        fetcher.clone(),
        Arc::new(MemoryDedupStore::new()),
        Arc::new(RecordingSink::new()),
        fast_tuning(),
        Duration::ZERO,
    )
    .with_bands(vec![Band::M40, Band::M20]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(fetcher.hang_calls(), 1, "stuck band stays in its one fetch");
    assert!(
        fetcher.ok_calls() >= 2,
        "healthy band must keep cycling while the other hangs (got {})",
        fetcher.ok_calls()
    );

    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("shutdown must also cancel the in-flight fetch")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_before_first_cycle_fetches_nothing() {
    let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
    let scheduler = Scheduler::new(
        fetcher.clone(),
        Arc::new(MemoryDedupStore::new()),
        Arc::new(RecordingSink::new()),
        RunnerTuning::default(),
        Duration::from_secs(5),
    )
    .with_bands(vec![Band::M40, Band::M20]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // Signal before the loops start; the jitter sleep must observe it.
    shutdown_tx.send(true).unwrap();
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_all_bands_get_their_own_loop() {
    let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
    let sink = Arc::new(RecordingSink::new());
    let scheduler = Scheduler::new(
        fetcher.clone(),
        Arc::new(MemoryDedupStore::new()),
        sink,
        RunnerTuning {
            quiet_cooldown: Duration::from_secs(30),
            ..RunnerTuning::default()
        },
        Duration::ZERO,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

    // One first cycle per enumerated band, none blocked by another.
    assert_eq!(fetcher.calls(), Band::all().len());
}
