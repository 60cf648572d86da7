//! Redis-backed cache service, shared between processes.

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::debug;

use super::store::{CacheError, KeyValueStore, Result};

fn backend_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

/// Redis implementation of [`KeyValueStore`].
///
/// The connection manager reconnects transparently and is cheap to clone, so
/// each call works on its own handle.
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
}

impl RedisKeyValueStore {
    /// Connects to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::InvalidConfig(format!("Invalid redis url '{url}': {e}")))?;
        let connection = ConnectionManager::new(client).await.map_err(backend_error)?;
        debug!(url = %url, "Connected to redis cache");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(backend_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value.as_ref(), seconds)
            .await
            .map_err(backend_error)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1) as i64;
        conn.expire(key, seconds).await.map_err(backend_error)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.connection.clone();
        let seconds: i64 = conn.ttl(key).await.map_err(backend_error)?;
        // -2: missing key, -1: no expiry
        Ok(match seconds {
            -2 => None,
            s if s < 0 => Some(Duration::MAX),
            s => Some(Duration::from_secs(s as u64)),
        })
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        conn.del(keys).await.map_err(backend_error)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        let mut keys: Vec<String> = conn.keys(pattern).await.map_err(backend_error)?;
        keys.sort();
        Ok(keys)
    }

    fn backend_type(&self) -> &str {
        "redis"
    }
}
