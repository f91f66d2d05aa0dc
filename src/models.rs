// Core data structures for the wsprpoll pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

/// One observed propagation report: who heard whom, where, and how strong.
///
/// The wire form is lower-camel-case JSON; the derived fields (`power_w`,
/// `distance_mi`) are recomputable downstream and never serialized. All
/// other fields participate in the content fingerprint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    /// Observation time (UTC, minute resolution upstream)
    pub timestamp: DateTime<Utc>,

    /// Transmitting callsign
    pub call: String,

    /// Transmit frequency in Hz
    pub frequency_hz: i64,

    /// Signal-to-noise ratio in dB
    pub snr: i32,

    /// Frequency drift in Hz/min
    pub drift: i32,

    /// Transmitter Maidenhead grid locator
    pub grid: String,

    /// Transmit power in dBm
    pub power_dbm: i32,

    /// Transmit power in watts, derived from `power_dbm`
    #[serde(skip)]
    pub power_w: f64,

    /// Receiving callsign
    pub reporter: String,

    /// Receiver Maidenhead grid locator
    pub reporter_grid: String,

    /// Great-circle distance in km
    pub distance_km: i32,

    /// Great-circle distance in miles, derived from `distance_km`
    #[serde(skip)]
    pub distance_mi: i32,

    /// Transmission mode (e.g. WSPR-2)
    pub mode: String,

    /// Reporting software version, when the row carries one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,

    /// Memoized content fingerprint; pure function of the fields above
    #[serde(skip, default)]
    fingerprint: OnceLock<String>,
}

impl Spot {
    /// Assemble a spot from its source fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        call: impl Into<String>,
        frequency_hz: i64,
        snr: i32,
        drift: i32,
        grid: impl Into<String>,
        power_dbm: i32,
        power_w: f64,
        reporter: impl Into<String>,
        reporter_grid: impl Into<String>,
        distance_km: i32,
        distance_mi: i32,
        mode: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            timestamp,
            call: call.into(),
            frequency_hz,
            snr,
            drift,
            grid: grid.into(),
            power_dbm,
            power_w,
            reporter: reporter.into(),
            reporter_grid: reporter_grid.into(),
            distance_km,
            distance_mi,
            mode: mode.into(),
            version,
            fingerprint: OnceLock::new(),
        }
    }

    /// Canonical string representation of the identifying fields.
    ///
    /// Derived fields are excluded so that two spots with identical
    /// observable content always render identically.
    fn canonical_string(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.call,
            self.frequency_hz as f64 / 1_000_000.0,
            self.snr,
            self.drift,
            self.grid,
            self.power_dbm,
            self.reporter,
            self.reporter_grid,
            self.distance_km,
            self.mode,
            self.version.as_deref().unwrap_or(""),
        )
    }

    /// SHA-256 content fingerprint, computed on first access and cached.
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update(self.canonical_string().as_bytes());
            format!("{:x}", hasher.finalize())
        })
    }
}

impl Clone for Spot {
    fn clone(&self) -> Self {
        // Carry an already-computed fingerprint along; it is a pure
        // function of the cloned fields.
        let fingerprint = OnceLock::new();
        if let Some(fp) = self.fingerprint.get() {
            let _ = fingerprint.set(fp.clone());
        }
        Self {
            timestamp: self.timestamp,
            call: self.call.clone(),
            frequency_hz: self.frequency_hz,
            snr: self.snr,
            drift: self.drift,
            grid: self.grid.clone(),
            power_dbm: self.power_dbm,
            power_w: self.power_w,
            reporter: self.reporter.clone(),
            reporter_grid: self.reporter_grid.clone(),
            distance_km: self.distance_km,
            distance_mi: self.distance_mi,
            mode: self.mode.clone(),
            version: self.version.clone(),
            fingerprint,
        }
    }
}

impl PartialEq for Spot {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.call == other.call
            && self.frequency_hz == other.frequency_hz
            && self.snr == other.snr
            && self.drift == other.drift
            && self.grid == other.grid
            && self.power_dbm == other.power_dbm
            && self.reporter == other.reporter
            && self.reporter_grid == other.reporter_grid
            && self.distance_km == other.distance_km
            && self.mode == other.mode
            && self.version == other.version
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}
