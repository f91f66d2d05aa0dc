//! Downstream publication of confirmed-new spots
//!
//! Each new spot is serialized to its camelCase wire form and published on
//! a routing key derived from band, mode, callsigns and grid locators. A
//! spot that cannot be routed (missing field or a grid locator shorter
//! than four characters) is silently dropped from publication; transport
//! failures are logged and swallowed, delivery guarantees belong to the
//! transport, not the poller.

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::band::Band;
use crate::error::PublishError;
use crate::models::Spot;

/// Receiver of confirmed-new spots.
#[async_trait]
pub trait SpotSink: Send + Sync {
    /// Deliver one spot. Never fails from the runner's point of view.
    async fn publish(&self, band: Band, spot: &Spot);
}

/// Build the routing key for a spot, or `None` when the spot lacks the
/// fields needed to route it.
///
/// Layout: `prefix.band.mode.call.grid.reporter.reporterGrid`, with grid
/// locators truncated to their 4-character square and the whole key
/// lowercased.
pub fn routing_key(prefix: &str, band: Band, spot: &Spot) -> Option<String> {
    let grid = grid_square(&spot.grid)?;
    let reporter_grid = grid_square(&spot.reporter_grid)?;
    if spot.mode.is_empty() || spot.call.is_empty() || spot.reporter.is_empty() {
        return None;
    }

    Some(
        format!(
            "{}.{}.{}.{}.{}.{}.{}",
            prefix,
            band.code(),
            spot.mode,
            spot.call,
            grid,
            spot.reporter,
            reporter_grid,
        )
        .to_lowercase(),
    )
}

/// First four characters of a grid locator, or `None` when it is too
/// short to name a grid square.
fn grid_square(grid: &str) -> Option<String> {
    if grid.chars().count() < 4 {
        return None;
    }
    Some(grid.chars().take(4).collect())
}

/// Redis pub/sub publisher.
pub struct RedisPublisher {
    pool: Pool,
    channel_prefix: String,
}

impl RedisPublisher {
    /// Create a publisher over an existing connection pool.
    pub fn new(pool: Pool, channel_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            channel_prefix: channel_prefix.into(),
        }
    }

    async fn try_publish(&self, key: &str, spot: &Spot) -> Result<(), PublishError> {
        let payload = serde_json::to_string(spot)?;
        let mut conn = self.pool.get().await?;
        let _: i64 = conn.publish(key, payload).await?;
        Ok(())
    }
}

#[async_trait]
impl SpotSink for RedisPublisher {
    async fn publish(&self, band: Band, spot: &Spot) {
        let Some(key) = routing_key(&self.channel_prefix, band, spot) else {
            tracing::debug!(band = %band, call = %spot.call, "spot not routable, skipping publish");
            return;
        };

        match self.try_publish(&key, spot).await {
            Ok(()) => {
                tracing::debug!(band = %band, key = %key, call = %spot.call, "published spot");
            }
            Err(e) => {
                tracing::warn!(band = %band, key = %key, error = %e, "failed to publish spot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn spot(grid: &str, reporter_grid: &str, mode: &str) -> Spot {
        Spot::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
            "K1ABC",
            7_040_100,
            -21,
            0,
            grid,
            37,
            5.012,
            "G4XYZ",
            reporter_grid,
            5300,
            3293,
            mode,
            None,
        )
    }

    #[test]
    fn test_routing_key_layout() {
        let key = routing_key("wspr", Band::M40, &spot("FN42ab", "IO91", "WSPR-2"));
        assert_eq!(key.as_deref(), Some("wspr.40.wspr-2.k1abc.fn42.g4xyz.io91"));
    }

    #[test]
    fn test_short_grid_drops_spot() {
        assert!(routing_key("wspr", Band::M40, &spot("FN4", "IO91", "WSPR-2")).is_none());
        assert!(routing_key("wspr", Band::M40, &spot("FN42", "IO", "WSPR-2")).is_none());
    }

    #[test]
    fn test_missing_mode_drops_spot() {
        assert!(routing_key("wspr", Band::M40, &spot("FN42", "IO91", "")).is_none());
    }

    #[test]
    fn test_microwave_band_segment() {
        let key = routing_key("wspr", Band::Microwave, &spot("FN42", "IO91", "WSPR-2"));
        assert_eq!(key.as_deref(), Some("wspr.u.wspr-2.k1abc.fn42.g4xyz.io91"));
    }
}
