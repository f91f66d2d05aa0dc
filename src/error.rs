//! Error types for the wsprpoll pipeline
//!
//! All per-cycle errors are recoverable and local: a band runner logs them
//! with band context, backs off for the error cooldown, and keeps looping.
//! The only fatal error in the program is missing mandatory startup
//! configuration, which is surfaced through `anyhow` at the binary boundary.

use thiserror::Error;

/// Errors that can occur while fetching a band page upstream.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection-level failure
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request timed out
    #[error("request timeout")]
    Timeout,

    /// Upstream answered with a non-success status
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Page structure was not recognized
    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Errors that can occur while parsing an upstream result page.
///
/// Individual malformed rows are dropped at the parse boundary and never
/// surface as errors; only an unrecognizable page does.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The expected spot table is missing from the page
    #[error("spot table not found in page")]
    TableNotFound,
}

/// Errors from the deduplication store.
#[derive(Error, Debug)]
pub enum DedupError {
    /// Could not obtain a pooled connection
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// A cache command failed
    #[error("redis command failed: {0}")]
    Command(#[from] redis::RedisError),
}

/// Errors from the publish transport.
///
/// These never reach the band runner; the sink logs and swallows them.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Could not obtain a pooled connection
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// The publish command failed
    #[error("redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// Payload serialization failed
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Any error a band runner can hit during one cycle.
///
/// The runner does not distinguish subtypes for control purposes, only
/// for logging; every variant resolves to the same cooldown-and-continue
/// path.
#[derive(Error, Debug)]
pub enum CycleError {
    /// Fetch pipeline failure (transport, status, or parse)
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Dedup store failure
    #[error("dedup store failed: {0}")]
    Dedup(#[from] DedupError),
}
