//! Adaptive request-limit controller
//!
//! A single-step reactive controller, not a smoothed average: it tracks a
//! moving equilibrium where requested capacity stays within roughly 2-3x
//! of observed demand. Over-fetching wastes upstream bandwidth,
//! under-fetching risks missing spots at the tail of the page.

/// Inclusive bounds for the request limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for LimitBounds {
    fn default() -> Self {
        Self { min: 100, max: 2000 }
    }
}

/// Compute the next request limit from the current limit and the number
/// of genuinely-new spots the cycle produced.
///
/// Shrinks geometrically (x0.8, floored) when far more capacity was
/// requested than needed, doubles when too little was requested relative
/// to what arrived, and clamps the result into `bounds` afterwards.
pub fn next_limit(current: u32, new_spots: u32, bounds: LimitBounds) -> u32 {
    let mut next = current;

    if current > new_spots.saturating_mul(3) {
        next = (0.8 * f64::from(current)) as u32;
    } else if current < new_spots.saturating_mul(2) {
        next = current.saturating_mul(2);
    }

    next.clamp(bounds.min, bounds.max)
}
