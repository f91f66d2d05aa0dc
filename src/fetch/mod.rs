//! HTTP fetch pipeline for upstream olddb pages
//!
//! [`HttpFetcher`] issues the per-band queries against the upstream
//! database, with a shared rate limiter as a global politeness cap across
//! all band loops. The band runners consume it through the
//! [`FetchPipeline`] trait so tests can substitute a scripted pipeline.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::band::Band;
use crate::error::FetchError;
use crate::models::Spot;
use crate::parser;

/// Source of raw candidate spots for one band.
#[async_trait]
pub trait FetchPipeline: Send + Sync {
    /// Request up to `limit` of the most recent spots for `band`.
    async fn fetch(&self, band: Band, limit: u32) -> Result<Vec<Spot>, FetchError>;
}

/// Upstream HTTP client configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the olddb endpoint
    pub base_url: Url,

    /// Request timeout
    pub timeout: Duration,

    /// User agent presented upstream
    pub user_agent: String,

    /// Global cap on requests per second, across all bands
    pub requests_per_second: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://www.wsprnet.org/olddb").expect("static url"),
            timeout: Duration::from_secs(30),
            user_agent: format!("wsprpoll/{}", env!("CARGO_PKG_VERSION")),
            requests_per_second: 2,
        }
    }
}

/// HTTP fetcher for olddb result pages.
pub struct HttpFetcher {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    base_url: Url,
}

impl HttpFetcher {
    /// Create a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second)
            .unwrap_or(NonZeroU32::new(1).expect("nonzero"));
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            base_url: config.base_url.clone(),
        })
    }

    /// Build the olddb query URL for one band page.
    fn spot_url(&self, band: Band, limit: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("mode", "html")
            .append_pair("band", band.code())
            .append_pair("limit", &limit.to_string())
            .append_pair("findcall", "")
            .append_pair("findreporter", "")
            .append_pair("sort", "date");
        url
    }
}

#[async_trait]
impl FetchPipeline for HttpFetcher {
    async fn fetch(&self, band: Band, limit: u32) -> Result<Vec<Spot>, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = self.spot_url(band, limit);
        tracing::debug!(band = %band, limit, "requesting spot page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let spots = parser::parse_spots(&body)?;
        Ok(spots)
    }
}
