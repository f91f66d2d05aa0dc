//! Plausibility window over spot timestamps
//!
//! Upstream occasionally lists spots with stale or skewed clocks. A spot
//! is only considered when its timestamp is strictly newer than the
//! retention horizon and strictly older than a small future slack that
//! tolerates clock skew against upstream.
//!
//! Rejected spots are dropped with no side effect: they are not recorded
//! in the dedup store, so a record reappearing later inside the valid
//! window is still considered.

use chrono::{DateTime, TimeDelta, Utc};

/// Is `timestamp` inside the open interval
/// `(now - max_age, now + future_slack)`?
pub fn within_window(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    max_age: TimeDelta,
    future_slack: TimeDelta,
) -> bool {
    timestamp > now - max_age && timestamp < now + future_slack
}
