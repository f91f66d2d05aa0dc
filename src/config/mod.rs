//! Configuration management for wsprpoll
//!
//! Configuration is loaded from environment variables with per-field
//! defaults. The one mandatory value is the Redis URL: it carries both
//! the dedup cache and the publish transport (including credentials), and
//! without it the process must not start any band task.

use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use std::time::Duration;
use url::Url;

use crate::fetch::FetchConfig;
use crate::poller::limit::LimitBounds;
use crate::poller::runner::RunnerTuning;

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream HTTP configuration
    pub upstream: UpstreamConfig,

    /// Redis connection and namespacing
    pub redis: RedisConfig,

    /// Publish sink configuration
    pub publish: PublishConfig,

    /// Poller timing and sizing
    pub poller: PollerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream service configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the olddb endpoint
    pub base_url: Url,

    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,

    /// Global cap on upstream requests per second
    pub requests_per_second: u32,

    /// User agent string
    pub user_agent: String,
}

/// Redis configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, including any credentials. Mandatory.
    pub url: String,

    /// Key prefix for namespacing dedup entries
    pub key_prefix: String,

    /// Connection pool size
    pub pool_size: usize,
}

/// Publish sink configuration.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Routing-key prefix for published spots
    pub channel_prefix: String,
}

/// Poller timing and sizing configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Minimum seconds between request completions per band
    pub min_request_interval_secs: u64,

    /// Extra cooldown seconds after a quiet cycle
    pub quiet_cooldown_secs: u64,

    /// Cooldown seconds after a failed cycle
    pub error_cooldown_secs: u64,

    /// New-spot count below which a band is quiet
    pub quiet_threshold: usize,

    /// Days a fingerprint stays remembered
    pub dedup_ttl_days: u64,

    /// Days back a spot timestamp is still plausible
    pub max_age_days: i64,

    /// Minutes of future clock skew tolerated
    pub future_slack_mins: i64,

    /// Lower bound for the adaptive request limit
    pub limit_min: u32,

    /// Upper bound for the adaptive request limit
    pub limit_max: u32,

    /// Request limit for the first cycle of each band
    pub initial_limit: u32,

    /// Maximum seconds of random delay before a band's first cycle
    pub initial_jitter_max_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `WSPR_REDIS_URL` is unset or when the limit bounds are
    /// inconsistent; both abort startup before any band task begins.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("WSPR_BASE_URL")
            .unwrap_or_else(|_| String::from("https://www.wsprnet.org/olddb"));
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("WSPR_BASE_URL is not a valid URL: {base_url}"))?;

        let redis_url = std::env::var("WSPR_REDIS_URL").context(
            "WSPR_REDIS_URL must be set; it carries the dedup cache and publish transport",
        )?;

        let config = Self {
            upstream: UpstreamConfig {
                base_url,
                http_timeout_secs: env_parsed("WSPR_HTTP_TIMEOUT", 30),
                requests_per_second: env_parsed("WSPR_REQUESTS_PER_SECOND", 2),
                user_agent: std::env::var("WSPR_USER_AGENT")
                    .unwrap_or_else(|_| format!("wsprpoll/{}", env!("CARGO_PKG_VERSION"))),
            },
            redis: RedisConfig {
                url: redis_url,
                key_prefix: std::env::var("WSPR_KEY_PREFIX")
                    .unwrap_or_else(|_| String::from("wsprpoll")),
                pool_size: env_parsed("WSPR_REDIS_POOL_SIZE", 10),
            },
            publish: PublishConfig {
                channel_prefix: std::env::var("WSPR_PUBLISH_CHANNEL")
                    .unwrap_or_else(|_| String::from("wspr")),
            },
            poller: PollerConfig {
                min_request_interval_secs: env_parsed("WSPR_MIN_REQUEST_INTERVAL", 5),
                quiet_cooldown_secs: env_parsed("WSPR_QUIET_COOLDOWN", 30),
                error_cooldown_secs: env_parsed("WSPR_ERROR_COOLDOWN", 30),
                quiet_threshold: env_parsed("WSPR_QUIET_THRESHOLD", 5),
                dedup_ttl_days: env_parsed("WSPR_DEDUP_TTL_DAYS", 7),
                max_age_days: env_parsed("WSPR_MAX_AGE_DAYS", 7),
                future_slack_mins: env_parsed("WSPR_FUTURE_SLACK_MINS", 10),
                limit_min: env_parsed("WSPR_LIMIT_MIN", 100),
                limit_max: env_parsed("WSPR_LIMIT_MAX", 2000),
                initial_limit: env_parsed("WSPR_INITIAL_LIMIT", 1000),
                initial_jitter_max_secs: env_parsed("WSPR_INITIAL_JITTER_MAX", 10),
            },
            logging: LoggingConfig {
                level: std::env::var("WSPR_LOG_LEVEL").unwrap_or_else(|_| String::from("info")),
                format: std::env::var("WSPR_LOG_FORMAT").unwrap_or_else(|_| String::from("text")),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let p = &self.poller;
        if p.limit_min == 0 || p.limit_min > p.limit_max {
            bail!(
                "limit bounds are inconsistent: min={} max={}",
                p.limit_min,
                p.limit_max
            );
        }
        if p.initial_limit < p.limit_min || p.initial_limit > p.limit_max {
            bail!(
                "initial limit {} is outside [{}, {}]",
                p.initial_limit,
                p.limit_min,
                p.limit_max
            );
        }
        Ok(())
    }

    /// Upstream fetcher configuration.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.upstream.base_url.clone(),
            timeout: Duration::from_secs(self.upstream.http_timeout_secs),
            user_agent: self.upstream.user_agent.clone(),
            requests_per_second: self.upstream.requests_per_second,
        }
    }

    /// Per-band runner tuning.
    pub fn runner_tuning(&self) -> RunnerTuning {
        let p = &self.poller;
        RunnerTuning {
            min_request_interval: Duration::from_secs(p.min_request_interval_secs),
            quiet_cooldown: Duration::from_secs(p.quiet_cooldown_secs),
            error_cooldown: Duration::from_secs(p.error_cooldown_secs),
            quiet_threshold: p.quiet_threshold,
            max_age: TimeDelta::days(p.max_age_days),
            future_slack: TimeDelta::minutes(p.future_slack_mins),
            dedup_ttl: Duration::from_secs(p.dedup_ttl_days * 24 * 3600),
            limits: LimitBounds {
                min: p.limit_min,
                max: p.limit_max,
            },
            initial_limit: p.initial_limit,
        }
    }

    /// Maximum random delay before a band's first cycle.
    pub fn initial_jitter_max(&self) -> Duration {
        Duration::from_secs(self.poller.initial_jitter_max_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            upstream: UpstreamConfig {
                base_url: Url::parse("https://www.wsprnet.org/olddb").unwrap(),
                http_timeout_secs: 30,
                requests_per_second: 2,
                user_agent: "wsprpoll/test".to_string(),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                key_prefix: "wsprpoll".to_string(),
                pool_size: 10,
            },
            publish: PublishConfig {
                channel_prefix: "wspr".to_string(),
            },
            poller: PollerConfig {
                min_request_interval_secs: 5,
                quiet_cooldown_secs: 30,
                error_cooldown_secs: 30,
                quiet_threshold: 5,
                dedup_ttl_days: 7,
                max_age_days: 7,
                future_slack_mins: 10,
                limit_min: 100,
                limit_max: 2000,
                initial_limit: 1000,
                initial_jitter_max_secs: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }

    #[test]
    fn test_runner_tuning_conversion() {
        let tuning = base_config().runner_tuning();
        assert_eq!(tuning.min_request_interval, Duration::from_secs(5));
        assert_eq!(tuning.quiet_cooldown, Duration::from_secs(30));
        assert_eq!(tuning.dedup_ttl, Duration::from_secs(604_800));
        assert_eq!(tuning.max_age, TimeDelta::days(7));
        assert_eq!(tuning.limits, LimitBounds { min: 100, max: 2000 });
        assert_eq!(tuning.initial_limit, 1000);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = base_config();
        config.poller.limit_min = 3000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_initial_limit_outside_bounds() {
        let mut config = base_config();
        config.poller.initial_limit = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fetch_config_conversion() {
        let fetch = base_config().fetch_config();
        assert_eq!(fetch.timeout, Duration::from_secs(30));
        assert_eq!(fetch.requests_per_second, 2);
    }
}
