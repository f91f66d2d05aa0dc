//! Band loop scheduling and lifecycle
//!
//! The scheduler owns one independent, long-running task per band. Each
//! task staggers its first cycle behind a uniform random jitter so the
//! bands do not issue their first request in lockstep, then loops its
//! runner's cycles until shutdown. Bands share no mutable state; a
//! failure or slowdown in one band's loop never blocks another.
//!
//! Shutdown is cooperative: a `watch` signal is observed at every
//! suspension point (jitter, pacing, cooldown, in-flight fetch) by
//! selecting over the whole cycle, and [`Scheduler::run`] resolves only
//! once every band task has exited. Band loops never exit on error, only
//! on shutdown.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::band::Band;
use crate::dedup::DedupStore;
use crate::fetch::FetchPipeline;
use crate::poller::runner::{BandRunner, RunnerTuning};
use crate::publish::SpotSink;

/// Drives one band runner per band, concurrently and independently.
pub struct Scheduler<F, D, S> {
    fetcher: Arc<F>,
    dedup: Arc<D>,
    sink: Arc<S>,
    tuning: RunnerTuning,
    bands: Vec<Band>,
    initial_jitter_max: Duration,
}

impl<F, D, S> Scheduler<F, D, S>
where
    F: FetchPipeline + 'static,
    D: DedupStore + 'static,
    S: SpotSink + 'static,
{
    pub fn new(
        fetcher: Arc<F>,
        dedup: Arc<D>,
        sink: Arc<S>,
        tuning: RunnerTuning,
        initial_jitter_max: Duration,
    ) -> Self {
        Self {
            fetcher,
            dedup,
            sink,
            tuning,
            bands: Band::all(),
            initial_jitter_max,
        }
    }

    /// Restrict polling to a subset of bands.
    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        self.bands = bands;
        self
    }

    /// Spawn every band loop and wait for all of them to exit.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let mut handles = Vec::with_capacity(self.bands.len());

        for band in self.bands {
            let runner = BandRunner::new(
                band,
                Arc::clone(&self.fetcher),
                Arc::clone(&self.dedup),
                Arc::clone(&self.sink),
                self.tuning.clone(),
            );
            let jitter = random_jitter(self.initial_jitter_max);
            handles.push(tokio::spawn(band_loop(runner, shutdown.clone(), jitter)));
        }

        tracing::info!(bands = handles.len(), "all band loops started");

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "band task aborted");
            }
        }

        tracing::info!("all band loops stopped");
    }
}

/// One band's infinite cycle loop.
async fn band_loop<F, D, S>(
    mut runner: BandRunner<F, D, S>,
    mut shutdown: watch::Receiver<bool>,
    jitter: Duration,
) where
    F: FetchPipeline,
    D: DedupStore,
    S: SpotSink,
{
    if *shutdown.borrow_and_update() {
        return;
    }

    tracing::debug!(band = %runner.band(), ?jitter, "staggering first cycle");
    tokio::select! {
        _ = tokio::time::sleep(jitter) => {}
        _ = shutdown.changed() => return,
    }

    let mut skip_delay = false;
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            next = runner.run_cycle(skip_delay) => skip_delay = next,
            _ = shutdown.changed() => break,
        }
    }

    tracing::debug!(band = %runner.band(), "band loop stopped");
}

/// Uniform random delay up to `max`, so first requests spread out.
fn random_jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max.as_millis() as u64))
}
