//! Per-band cycle state machine
//!
//! A [`BandRunner`] owns one band's mutable state (current request limit,
//! last-request clock, tuning) for the process lifetime. Each cycle paces
//! itself, fetches a page, filters implausible timestamps, emits the
//! spots the dedup store has not seen, adapts the request limit, and
//! decides whether the next cycle may skip its pacing delay.
//!
//! Any fetch or dedup failure is local to the cycle: logged with band
//! context, resolved by the error cooldown, never escalated.

use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::band::Band;
use crate::dedup::DedupStore;
use crate::error::CycleError;
use crate::fetch::FetchPipeline;
use crate::models::Spot;
use crate::poller::filter::within_window;
use crate::poller::limit::{next_limit, LimitBounds};
use crate::publish::SpotSink;

/// Timing and sizing knobs for one band runner.
#[derive(Debug, Clone)]
pub struct RunnerTuning {
    /// Minimum gap between request completions; guards against
    /// back-to-back bursts only, general politeness comes from the limit
    /// controller and the quiet cooldown.
    pub min_request_interval: Duration,

    /// Extra sleep after a cycle that found fewer than
    /// `quiet_threshold` new spots
    pub quiet_cooldown: Duration,

    /// Sleep after a failed cycle
    pub error_cooldown: Duration,

    /// New-spot count below which a band is considered quiet
    pub quiet_threshold: usize,

    /// Oldest acceptable spot age
    pub max_age: TimeDelta,

    /// Future skew tolerated on spot timestamps
    pub future_slack: TimeDelta,

    /// Retention window for remembered fingerprints
    pub dedup_ttl: Duration,

    /// Bounds for the adaptive request limit
    pub limits: LimitBounds,

    /// Request limit for the first cycle
    pub initial_limit: u32,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_secs(5),
            quiet_cooldown: Duration::from_secs(30),
            error_cooldown: Duration::from_secs(30),
            quiet_threshold: 5,
            max_age: TimeDelta::days(7),
            future_slack: TimeDelta::minutes(10),
            dedup_ttl: Duration::from_secs(7 * 24 * 3600),
            limits: LimitBounds::default(),
            initial_limit: 1000,
        }
    }
}

/// One band's polling state machine.
///
/// Owned exclusively by that band's task; never shared or read by other
/// bands.
pub struct BandRunner<F, D, S> {
    band: Band,
    fetcher: Arc<F>,
    dedup: Arc<D>,
    sink: Arc<S>,
    tuning: RunnerTuning,
    limit: u32,
    last_request: Option<Instant>,
}

impl<F, D, S> BandRunner<F, D, S>
where
    F: FetchPipeline,
    D: DedupStore,
    S: SpotSink,
{
    pub fn new(
        band: Band,
        fetcher: Arc<F>,
        dedup: Arc<D>,
        sink: Arc<S>,
        tuning: RunnerTuning,
    ) -> Self {
        let limit = tuning.initial_limit.clamp(tuning.limits.min, tuning.limits.max);
        Self {
            band,
            fetcher,
            dedup,
            sink,
            tuning,
            limit,
            last_request: None,
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    /// Request limit the next cycle will use.
    pub fn current_limit(&self) -> u32 {
        self.limit
    }

    /// Run one full cycle and report whether the next cycle should skip
    /// its pacing delay (upstream likely has more matching data ready).
    ///
    /// Never fails: a failed cycle is logged, resolved by the error
    /// cooldown and reported as "do not skip the delay". The limit and
    /// the request clock are left untouched by the failure path.
    pub async fn run_cycle(&mut self, skip_delay: bool) -> bool {
        match self.cycle(skip_delay).await {
            Ok(saturated) => saturated,
            Err(e) => {
                tracing::warn!(band = %self.band, error = %e, "cycle failed, backing off");
                sleep(self.tuning.error_cooldown).await;
                false
            }
        }
    }

    async fn cycle(&mut self, skip_delay: bool) -> Result<bool, CycleError> {
        self.pace(skip_delay).await;

        let requested = self.limit;
        let raw = self.fetcher.fetch(self.band, requested).await?;
        // The clock measures the gap between request completions, not
        // between cycle starts.
        self.last_request = Some(Instant::now());
        let raw_count = raw.len();

        let candidates = self.time_filter(raw);
        let new_count = self.emit_new(&candidates).await?;

        tracing::info!(
            band = %self.band,
            new = new_count,
            candidates = candidates.len(),
            raw = raw_count,
            limit = requested,
            "cycle complete"
        );

        self.limit = self.adjust_limit(new_count as u32);

        if !skip_delay && new_count < self.tuning.quiet_threshold {
            tracing::debug!(band = %self.band, "quiet band, cooling down");
            sleep(self.tuning.quiet_cooldown).await;
        }

        // A page filled exactly to the requested limit means upstream may
        // hold more matching records; re-poll without waiting to drain
        // the backlog.
        Ok(raw_count as u32 == requested)
    }

    /// Wait out the remainder of the minimum inter-request interval.
    /// No-op on the first cycle or when the caller asked to skip.
    async fn pace(&self, skip_delay: bool) {
        let Some(last) = self.last_request else {
            return;
        };
        if skip_delay {
            return;
        }

        let elapsed = last.elapsed();
        if elapsed < self.tuning.min_request_interval {
            let wait = self.tuning.min_request_interval - elapsed;
            tracing::debug!(band = %self.band, ?wait, "pacing before next request");
            sleep(wait).await;
        } else {
            tracing::debug!(band = %self.band, "enough time has passed, no pacing needed");
        }
    }

    fn time_filter(&self, raw: Vec<Spot>) -> Vec<Spot> {
        let now = Utc::now();
        raw.into_iter()
            .filter(|spot| {
                within_window(spot.timestamp, now, self.tuning.max_age, self.tuning.future_slack)
            })
            .collect()
    }

    /// Emit every candidate the store has not seen, remembering each
    /// emitted fingerprint for the retention window. Returns the number
    /// of genuinely-new spots.
    async fn emit_new(&self, candidates: &[Spot]) -> Result<usize, CycleError> {
        let mut new_count = 0;
        for spot in candidates {
            let fingerprint = spot.fingerprint();
            if self.dedup.contains(fingerprint).await? {
                continue;
            }
            self.sink.publish(self.band, spot).await;
            self.dedup.remember(fingerprint, self.tuning.dedup_ttl).await?;
            new_count += 1;
        }
        Ok(new_count)
    }

    fn adjust_limit(&self, new_spots: u32) -> u32 {
        let next = next_limit(self.limit, new_spots, self.tuning.limits);

        let grew = self.limit < new_spots.saturating_mul(2);
        if next == self.tuning.limits.max && grew && self.limit.saturating_mul(2) > self.tuning.limits.max {
            // Sustained high volume for this band.
            tracing::warn!(band = %self.band, limit = next, "request limit capped at maximum");
        } else if next != self.limit {
            tracing::info!(
                band = %self.band,
                from = self.limit,
                to = next,
                new_spots,
                "adjusted request limit"
            );
        }

        next
    }
}
