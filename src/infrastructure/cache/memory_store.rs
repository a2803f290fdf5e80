//! In-process ephemeral store used when Redis is not configured or unreachable.

use super::service::{CacheError, CacheResult, EphemeralStore};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// DashMap-backed store with per-key expiry.
///
/// Expired keys are treated as absent on access and dropped by
/// [`MemoryStore::purge_expired`], which the server runs periodically.
/// Read-modify-write operations run under the DashMap shard lock, so `incr`
/// is atomic across tasks. State is per process: limits and cached
/// destinations are not shared between replicas.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("Using in-memory ephemeral store");
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Removes every expired key. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, slot| slot.is_live(now));
        before.saturating_sub(self.inner.len())
    }

    /// Number of keys currently held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        Ok(self
            .inner
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        let now = Instant::now();
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if !slot.is_live(now) {
                    *slot = Slot {
                        value: "1".to_string(),
                        expires_at: None,
                    };
                    return Ok(1);
                }
                let current: i64 = slot.value.parse().map_err(|_| {
                    CacheError::Operation(format!("value at '{}' is not an integer", key))
                })?;
                let next = current + 1;
                slot.value = next.to_string();
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    value: "1".to_string(),
                    expires_at: None,
                });
                Ok(1)
            }
        }
    }

    async fn incr_window(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        let now = Instant::now();
        let fresh = Slot {
            value: "1".to_string(),
            expires_at: Some(now + ttl),
        };
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if !slot.is_live(now) {
                    *slot = fresh;
                    return Ok(1);
                }
                let current: i64 = slot.value.parse().map_err(|_| {
                    CacheError::Operation(format!("value at '{}' is not an integer", key))
                })?;
                slot.value = (current + 1).to_string();
                if slot.expires_at.is_none() {
                    slot.expires_at = Some(now + ttl);
                }
                Ok(current + 1)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(1)
            }
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
