//! Ephemeral storage for redirects and rate limiting.
//!
//! Provides an [`EphemeralStore`] trait with two implementations:
//! - [`RedisStore`] - Production Redis-backed store
//! - [`MemoryStore`] - In-process fallback when Redis is absent
//!
//! [`DestinationCache`] layers the cache-aside destination lookup on top.

mod destination_cache;
mod memory_store;
mod redis_store;
mod service;

pub use destination_cache::{DEFAULT_CACHE_TTL, DestinationCache, INVALIDATION_GUARD};
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use service::{CacheError, CacheResult, EphemeralStore};

#[cfg(test)]
pub use service::MockEphemeralStore;
