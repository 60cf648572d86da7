//! Cache service for synthesized audio and provider credentials.
//!
//! The in-process Moka backend is always available; the Redis backend is
//! compiled in with the `redis-cache` feature.

#[cfg(feature = "redis-cache")]
pub mod redis;
pub mod store;

#[cfg(feature = "redis-cache")]
pub use self::redis::RedisKeyValueStore;
pub use store::{
    CacheConfig, CacheError, CacheMetrics, KeyValueStore, MemoryKeyValueStore, Result,
    create_store,
};
