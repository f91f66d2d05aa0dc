//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use wsprpoll::band::Band;
use wsprpoll::error::FetchError;
use wsprpoll::fetch::FetchPipeline;
use wsprpoll::models::Spot;
use wsprpoll::publish::SpotSink;

/// Build a plausible spot, distinct per callsign and timestamp.
pub fn spot_at(timestamp: DateTime<Utc>, call: &str) -> Spot {
    Spot::new(
        timestamp.with_second(0).unwrap().with_nanosecond(0).unwrap(),
        call,
        7_040_100,
        -21,
        0,
        "FN42",
        37,
        5.012,
        "G4XYZ",
        "IO91",
        5300,
        3293,
        "WSPR-2",
        Some("2.6.1".to_string()),
    )
}

/// A spot observed right now.
pub fn fresh_spot(call: &str) -> Spot {
    spot_at(Utc::now(), call)
}

/// Fetch pipeline that replays a scripted sequence of responses, then
/// keeps returning empty pages.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<Spot>, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<Spot>, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchPipeline for ScriptedFetcher {
    async fn fetch(&self, _band: Band, _limit: u32) -> Result<Vec<Spot>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Fetch pipeline for isolation tests: one band's requests hang forever,
/// every other band gets one fresh, distinct spot per call.
pub struct HangingBandFetcher {
    hang_band: Band,
    hang_calls: AtomicUsize,
    ok_calls: AtomicUsize,
}

impl HangingBandFetcher {
    pub fn new(hang_band: Band) -> Self {
        Self {
            hang_band,
            hang_calls: AtomicUsize::new(0),
            ok_calls: AtomicUsize::new(0),
        }
    }

    pub fn hang_calls(&self) -> usize {
        self.hang_calls.load(Ordering::SeqCst)
    }

    pub fn ok_calls(&self) -> usize {
        self.ok_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchPipeline for HangingBandFetcher {
    async fn fetch(&self, band: Band, _limit: u32) -> Result<Vec<Spot>, FetchError> {
        if band == self.hang_band {
            self.hang_calls.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().await
        } else {
            let n = self.ok_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![spot_at(Utc::now(), &format!("K{n}ABC"))])
        }
    }
}

/// Sink that records everything it is handed.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(Band, Spot)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(Band, Spot)> {
        self.published.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl SpotSink for RecordingSink {
    async fn publish(&self, band: Band, spot: &Spot) {
        self.published.lock().unwrap().push((band, spot.clone()));
    }
}
