//! wsprpoll - adaptive per-band WSPR spot poller
//!
//! Continuously polls the upstream propagation database for newly
//! observed spot reports, partitioned by frequency band, and forwards
//! previously-unseen spots downstream exactly once per retention window.
//!
//! # Architecture
//!
//! - [`band`] - frequency band enumeration and upstream query codes
//! - [`models`] - the [`models::Spot`] entity and its content fingerprint
//! - [`parser`] - HTML table parsing of upstream result pages
//! - [`fetch`] - rate-limited HTTP fetch pipeline
//! - [`dedup`] - TTL-keyed fingerprint membership cache
//! - [`publish`] - routing-key construction and the downstream sink
//! - [`poller`] - the per-band adaptive polling engine
//! - [`scheduler`] - one independent polling loop per band
//! - [`config`] - environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::watch;
//! use wsprpoll::dedup::MemoryDedupStore;
//! use wsprpoll::fetch::{FetchConfig, HttpFetcher};
//! use wsprpoll::poller::RunnerTuning;
//! use wsprpoll::publish::SpotSink;
//! use wsprpoll::scheduler::Scheduler;
//!
//! # struct NullSink;
//! # #[async_trait::async_trait]
//! # impl SpotSink for NullSink {
//! #     async fn publish(&self, _band: wsprpoll::band::Band, _spot: &wsprpoll::models::Spot) {}
//! # }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default())?);
//!     let dedup = Arc::new(MemoryDedupStore::new());
//!     let sink = Arc::new(NullSink);
//!
//!     let scheduler = Scheduler::new(
//!         fetcher,
//!         dedup,
//!         sink,
//!         RunnerTuning::default(),
//!         std::time::Duration::from_secs(10),
//!     );
//!
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     scheduler.run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```

pub mod band;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod poller;
pub mod publish;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::band::Band;
    pub use crate::config::Config;
    pub use crate::dedup::{DedupStore, MemoryDedupStore, RedisDedupStore};
    pub use crate::error::{CycleError, DedupError, FetchError, ParseError, PublishError};
    pub use crate::fetch::{FetchConfig, FetchPipeline, HttpFetcher};
    pub use crate::models::Spot;
    pub use crate::poller::{BandRunner, LimitBounds, RunnerTuning};
    pub use crate::publish::{RedisPublisher, SpotSink};
    pub use crate::scheduler::Scheduler;
}

// Direct re-exports for convenience
pub use band::Band;
pub use models::Spot;
