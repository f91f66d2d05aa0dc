//! Frequency band enumeration and upstream query-code mapping
//!
//! The upstream olddb pages are partitioned by band; each [`Band`] maps to
//! the static query code the upstream form uses for that partition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frequency bands reported by the upstream service.
///
/// This is a closed set mirroring the band selector of the upstream query
/// form, from the combined 2190/630 m allocation up to the microwave bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// 2190 m and 630 m (reported together upstream)
    M2190,
    /// 160 m
    M160,
    /// 80 m
    M80,
    /// 60 m
    M60,
    /// 40 m
    M40,
    /// 30 m
    M30,
    /// 20 m
    M20,
    /// 17 m
    M17,
    /// 15 m
    M15,
    /// 12 m
    M12,
    /// 10 m
    M10,
    /// 8 m
    M8,
    /// 6 m
    M6,
    /// 4 m
    M4,
    /// 2 m
    M2,
    /// 1.25 m (220 MHz)
    M220,
    /// 70 cm (432 MHz)
    M432,
    /// Everything above 1 GHz
    Microwave,
}

impl Band {
    /// All known bands, in upstream form order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::M2190,
            Self::M160,
            Self::M80,
            Self::M60,
            Self::M40,
            Self::M30,
            Self::M20,
            Self::M17,
            Self::M15,
            Self::M12,
            Self::M10,
            Self::M8,
            Self::M6,
            Self::M4,
            Self::M2,
            Self::M220,
            Self::M432,
            Self::Microwave,
        ]
    }

    /// Query code understood by the upstream band filter.
    pub fn code(&self) -> &'static str {
        match self {
            Self::M2190 => "2190",
            Self::M160 => "160",
            Self::M80 => "80",
            Self::M60 => "60",
            Self::M40 => "40",
            Self::M30 => "30",
            Self::M20 => "20",
            Self::M17 => "17",
            Self::M15 => "15",
            Self::M12 => "12",
            Self::M10 => "10",
            Self::M8 => "8",
            Self::M6 => "6",
            Self::M4 => "4",
            Self::M2 => "2",
            Self::M220 => "220",
            Self::M432 => "432",
            Self::Microwave => "u",
        }
    }

    /// Human-readable label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::M2190 => "2190/630m",
            Self::M160 => "160m",
            Self::M80 => "80m",
            Self::M60 => "60m",
            Self::M40 => "40m",
            Self::M30 => "30m",
            Self::M20 => "20m",
            Self::M17 => "17m",
            Self::M15 => "15m",
            Self::M12 => "12m",
            Self::M10 => "10m",
            Self::M8 => "8m",
            Self::M6 => "6m",
            Self::M4 => "4m",
            Self::M2 => "2m",
            Self::M220 => "1.25m",
            Self::M432 => "70cm",
            Self::Microwave => "uwave",
        }
    }

    /// Parse from a query code or label, case-insensitively.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|b| b.code() == id || b.label().to_lowercase() == id)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("unknown band: {s}"))
    }
}
