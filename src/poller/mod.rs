//! Per-band adaptive polling engine
//!
//! The control loop that decides how much data to request, how long to
//! wait between requests, how to suppress duplicates across restarts and
//! how to recover from transient failures:
//!
//! - [`limit`] - single-step reactive page-size controller
//! - [`filter`] - plausibility window over spot timestamps
//! - [`runner`] - the per-band cycle state machine

pub mod filter;
pub mod limit;
pub mod runner;

pub use filter::within_window;
pub use limit::{next_limit, LimitBounds};
pub use runner::{BandRunner, RunnerTuning};
