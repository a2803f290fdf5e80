//! Cache-aside mapping from short code to destination URL.

use super::service::EphemeralStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default lifetime of a cached destination.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// How long an invalidation blocks read-path fills for its code. Must outlast
/// the longest resolution, which the resolve timeout caps.
pub const INVALIDATION_GUARD: Duration = Duration::from_secs(30);

/// Destination lookups in front of the durable store.
///
/// Entries live under `link:{code}:destination`. The cache is never
/// authoritative for active or expiry state. Store failures are logged and
/// degrade to a miss or a no-op; nothing here returns an error.
///
/// Invalidation leaves a marker at `link:{code}:invalidated` for
/// [`INVALIDATION_GUARD`]. Read-path fills go through [`DestinationCache::fill`],
/// which backs off while the marker exists, so a lookup that read the row
/// before an update cannot put the old destination back.
#[derive(Clone)]
pub struct DestinationCache {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

impl DestinationCache {
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn key(code: &str) -> String {
        format!("link:{}:destination", code)
    }

    fn guard_key(code: &str) -> String {
        format!("link:{}:invalidated", code)
    }

    async fn invalidated_recently(&self, code: &str) -> bool {
        match self.store.get(&Self::guard_key(code)).await {
            Ok(marker) => marker.is_some(),
            Err(e) => {
                warn!(code, error = %e, "Invalidation marker unreadable, skipping fill");
                true
            }
        }
    }

    pub async fn get(&self, code: &str) -> Option<String> {
        match self.store.get(&Self::key(code)).await {
            Ok(Some(destination)) => {
                debug!(code, "Cache HIT");
                Some(destination)
            }
            Ok(None) => {
                debug!(code, "Cache MISS");
                None
            }
            Err(e) => {
                warn!(code, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn set(&self, code: &str, destination: &str) {
        if let Err(e) = self
            .store
            .set_ex(&Self::key(code), destination, self.ttl)
            .await
        {
            warn!(code, error = %e, "Cache write failed");
        }
    }

    /// Caches a destination read from the store on a miss.
    ///
    /// Skipped while an invalidation marker exists. The marker is checked
    /// again after the write and the entry dropped if one appeared meanwhile.
    pub async fn fill(&self, code: &str, destination: &str) {
        if self.invalidated_recently(code).await {
            debug!(code, "Cache fill skipped after invalidation");
            return;
        }

        self.set(code, destination).await;

        if self.invalidated_recently(code).await {
            debug!(code, "Cache fill raced an invalidation, dropping entry");
            self.delete_entry(code).await;
        }
    }

    /// Drops the cached destination and blocks read-path fills for
    /// [`INVALIDATION_GUARD`].
    pub async fn invalidate(&self, code: &str) {
        if let Err(e) = self
            .store
            .set_ex(&Self::guard_key(code), "1", INVALIDATION_GUARD)
            .await
        {
            warn!(code, error = %e, "Invalidation marker write failed");
        }
        self.delete_entry(code).await;
    }

    async fn delete_entry(&self, code: &str) {
        match self.store.delete(&Self::key(code)).await {
            Ok(()) => debug!(code, "Cache INVALIDATE"),
            Err(e) => warn!(code, error = %e, "Cache invalidation failed"),
        }
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
