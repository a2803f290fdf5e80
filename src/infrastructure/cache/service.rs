//! Ephemeral store trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during ephemeral store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
    #[error("Cache operation error: {0}")]
    Operation(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Operation(e.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store with expiry and atomic counters.
///
/// Backs both the destination cache and the rate limiter. Implementations
/// return errors instead of swallowing them; callers decide how to degrade.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisStore`] - Redis via `ConnectionManager`
/// - [`crate::infrastructure::cache::MemoryStore`] - In-process fallback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically increments an integer key, creating it at 0 first if absent.
    ///
    /// Returns the value after the increment. Existing expiry is preserved.
    async fn incr(&self, key: &str) -> CacheResult<i64>;

    /// Increments a window counter in one atomic step, giving it `ttl` as
    /// expiry whenever the key has none (new, or left without one).
    ///
    /// An existing expiry is never extended.
    async fn incr_window(&self, key: &str, ttl: Duration) -> CacheResult<i64>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
