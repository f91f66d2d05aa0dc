//! TTL-keyed membership cache for spot deduplication
//!
//! Every confirmed-new spot's fingerprint is remembered for a fixed
//! retention window so that restarts do not re-emit spots the upstream
//! source still lists. Entries expiring silently is accepted: a spot
//! reappearing after its entry lapsed is legitimately treated as new
//! again (bounded re-delivery, not a correctness bug).

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::DedupError;

/// Membership cache keyed by content fingerprint.
///
/// Safe for concurrent use from all band tasks; each operation is a
/// single key lookup or a single key insert with TTL.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Has this fingerprint been seen within its retention window?
    async fn contains(&self, fingerprint: &str) -> Result<bool, DedupError>;

    /// Remember a fingerprint for `ttl`.
    async fn remember(&self, fingerprint: &str, ttl: Duration) -> Result<(), DedupError>;
}

/// Redis-backed dedup store shared by all band tasks.
pub struct RedisDedupStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisDedupStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, fingerprint: &str) -> String {
        format!("{}:spot:{}", self.key_prefix, fingerprint)
    }

    /// Probe connectivity. Used at startup for a log line only; a failed
    /// ping is not fatal, the per-cycle error path covers outages.
    pub async fn ping(&self) -> Result<(), DedupError> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl DedupStore for RedisDedupStore {
    async fn contains(&self, fingerprint: &str) -> Result<bool, DedupError> {
        let mut conn = self.pool.get().await?;
        let exists: bool = conn.exists(self.key(fingerprint)).await?;
        Ok(exists)
    }

    async fn remember(&self, fingerprint: &str, ttl: Duration) -> Result<(), DedupError> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(self.key(fingerprint), 1u8, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}

/// In-process dedup store with the same TTL semantics.
///
/// Used by the test suite and for cache-less local runs; entries expire
/// lazily on lookup.
#[derive(Default)]
pub struct MemoryDedupStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|expiry| **expiry > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    async fn contains(&self, fingerprint: &str) -> Result<bool, DedupError> {
        let mut entries = self.entries.lock().await;
        match entries.get(fingerprint) {
            Some(expiry) if *expiry > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(fingerprint);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn remember(&self, fingerprint: &str, ttl: Duration) -> Result<(), DedupError> {
        self.entries
            .lock()
            .await
            .insert(fingerprint.to_string(), Instant::now() + ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryDedupStore::new();
        assert!(!store.contains("abc").await.unwrap());

        store.remember("abc", Duration::from_secs(60)).await.unwrap();
        assert!(store.contains("abc").await.unwrap());
        assert!(!store.contains("def").await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_entries_expire() {
        let store = MemoryDedupStore::new();
        store.remember("abc", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(!store.contains("abc").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_reremember_extends_ttl() {
        let store = MemoryDedupStore::new();
        store.remember("abc", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        store.remember("abc", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(store.contains("abc").await.unwrap());
    }

    #[test]
    fn test_redis_key_namespacing() {
        // Key layout only; command behavior needs a live server.
        let cfg = deadpool_redis::Config::from_url("redis://localhost:6379");
        let pool = cfg
            .builder()
            .unwrap()
            .max_size(1)
            .runtime(deadpool_redis::Runtime::Tokio1)
            .build()
            .unwrap();
        let store = RedisDedupStore::new(pool, "wsprpoll");
        assert_eq!(store.key("deadbeef"), "wsprpoll:spot:deadbeef");
    }
}
