//! Key-value cache service used for synthesized audio and session credentials.
//!
//! The synthesis core only talks to the [`KeyValueStore`] trait, which mirrors
//! the handful of Redis commands it needs (`GET`, `SET EX`, `EXPIRE`, `TTL`,
//! `DEL`, `KEYS`). The default backend is an in-process Moka cache with
//! per-entry expiry; a Redis backend is available behind the `redis-cache`
//! feature for deployments where several processes share one cache.

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::{Cache as MokaCache, CacheBuilder as MokaCacheBuilder};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend-specific error (connection loss, protocol error, ...).
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A key pattern could not be parsed.
    #[error("Invalid key pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Interface of the external cache service.
///
/// Every write is wholesale: values are replaced, never partially mutated.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieves a value by key, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Stores a value, replacing any previous one, with the given TTL.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Resets the TTL of an existing entry. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remaining time to live of an entry, `None` when absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Deletes the given keys and returns how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// Lists keys matching a glob-style pattern (`*`, `?`, `[...]`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Metrics tracking for cache operations.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<RwLock<u64>>,
    misses: Arc<RwLock<u64>>,
    sets: Arc<RwLock<u64>>,
    deletes: Arc<RwLock<u64>>,
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMetrics {
    /// Creates a new metrics instance.
    pub fn new() -> Self {
        Self {
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            sets: Arc::new(RwLock::new(0)),
            deletes: Arc::new(RwLock::new(0)),
        }
    }

    pub fn record_hit(&self) {
        *self.hits.write() += 1;
    }

    pub fn record_miss(&self) {
        *self.misses.write() += 1;
    }

    pub fn record_set(&self) {
        *self.sets.write() += 1;
    }

    pub fn record_delete(&self, count: u64) {
        *self.deletes.write() += count;
    }

    /// Returns current statistics as a tuple (hits, misses, sets, deletes).
    pub fn get_stats(&self) -> (u64, u64, u64, u64) {
        (
            *self.hits.read(),
            *self.misses.read(),
            *self.sets.read(),
            *self.deletes.read(),
        )
    }
}

/// Internal structure for memory cache entries with expiration.
struct StoredValue {
    data: Bytes,
    expires_at: Instant,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Compiles a Redis-style glob pattern.
pub(crate) fn compile_pattern(pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|e| CacheError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Memory-based cache backend using Moka.
pub struct MemoryKeyValueStore {
    cache: MokaCache<String, Arc<StoredValue>>,
    metrics: CacheMetrics,
}

impl MemoryKeyValueStore {
    /// Creates a new memory store bounded to `max_entries` entries.
    pub fn new(max_entries: u64) -> Self {
        let cache = MokaCacheBuilder::new(max_entries).build();
        Self {
            cache,
            metrics: CacheMetrics::new(),
        }
    }

    /// Returns the cache metrics.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    async fn live_entry(&self, key: &str) -> Option<Arc<StoredValue>> {
        let entry = self.cache.get(key).await?;
        if entry.is_live(Instant::now()) {
            Some(entry)
        } else {
            self.cache.invalidate(key).await;
            None
        }
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match self.live_entry(key).await {
            Some(entry) => {
                self.metrics.record_hit();
                Ok(Some(entry.data.clone()))
            }
            None => {
                self.metrics.record_miss();
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        debug!(key = %key, size = value.len(), ttl = ?ttl, "Storing cache entry");
        let entry = Arc::new(StoredValue {
            data: value,
            expires_at: Instant::now() + ttl,
        });
        self.cache.insert(key.to_string(), entry).await;
        self.metrics.record_set();
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let Some(entry) = self.live_entry(key).await else {
            return Ok(false);
        };
        let refreshed = Arc::new(StoredValue {
            data: entry.data.clone(),
            expires_at: Instant::now() + ttl,
        });
        self.cache.insert(key.to_string(), refreshed).await;
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self
            .live_entry(key)
            .await
            .map(|entry| entry.expires_at.saturating_duration_since(Instant::now())))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let now = Instant::now();
        let mut removed = 0u64;
        for key in keys {
            if let Some(entry) = self.cache.remove(key.as_str()).await
                && entry.is_live(now)
            {
                removed += 1;
            }
        }
        self.metrics.record_delete(removed);
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = compile_pattern(pattern)?;
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && matcher.matches(key.as_str()))
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Cache configuration options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheConfig {
    /// In-process cache.
    Memory {
        /// Maximum number of entries.
        max_entries: u64,
    },
    /// Shared Redis cache (requires the `redis-cache` feature).
    Redis {
        /// Connection URL, e.g. `redis://127.0.0.1:6379/0`.
        url: String,
    },
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::Memory {
            max_entries: 100_000,
        }
    }
}

/// Creates the configured cache service connection.
pub async fn create_store(config: &CacheConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config {
        CacheConfig::Memory { max_entries } => {
            Ok(Arc::new(MemoryKeyValueStore::new(*max_entries)))
        }
        #[cfg(feature = "redis-cache")]
        CacheConfig::Redis { url } => Ok(Arc::new(
            super::redis::RedisKeyValueStore::connect(url).await?,
        )),
        #[cfg(not(feature = "redis-cache"))]
        CacheConfig::Redis { .. } => {
            warn!("Redis cache requested but the redis-cache feature is disabled");
            Err(CacheError::InvalidConfig(
                "Redis cache requires the 'redis-cache' feature. Rebuild with --features redis-cache"
                    .to_string(),
            ))
        }
    }
}
