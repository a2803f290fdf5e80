//! Short code resolution for redirects.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::DestinationCache;

/// Default budget for a complete resolution.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Why a code did not resolve to a destination.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Short link not found")]
    NotFound,
    #[error("Short link is inactive")]
    Inactive,
    #[error("Short link has expired")]
    Expired,
    #[error("Resolution unavailable: {0}")]
    Unavailable(String),
}

impl ResolveError {
    pub fn outcome(&self) -> &'static str {
        match self {
            ResolveError::NotFound => "not_found",
            ResolveError::Inactive => "inactive",
            ResolveError::Expired => "expired",
            ResolveError::Unavailable(_) => "unavailable",
        }
    }
}

impl From<ResolveError> for AppError {
    /// Missing, inactive and expired links share one response body.
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound | ResolveError::Inactive | ResolveError::Expired => {
                AppError::not_found("Short link not found", json!({}))
            }
            ResolveError::Unavailable(_) => {
                AppError::unavailable("Service temporarily unavailable", json!({}))
            }
        }
    }
}

/// Resolves short codes through the destination cache, falling back to the store.
///
/// A cache hit is returned without re-checking active or expiry state. A link
/// deactivated or expired while cached keeps redirecting until its entry is
/// invalidated or reaches its TTL. Misses fill the cache through
/// [`DestinationCache::fill`], which yields to a concurrent invalidation.
pub struct RedirectService<L: LinkRepository + ?Sized = dyn LinkRepository> {
    link_repository: Arc<L>,
    cache: DestinationCache,
    timeout: Duration,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(link_repository: Arc<L>, cache: DestinationCache, timeout: Duration) -> Self {
        Self {
            link_repository,
            cache,
            timeout,
        }
    }

    /// Returns the destination URL for `code`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`], [`ResolveError::Inactive`], [`ResolveError::Expired`]
    /// - [`ResolveError::Unavailable`] on store failure or when the timeout budget elapses
    pub async fn resolve(&self, code: &str) -> Result<String, ResolveError> {
        match tokio::time::timeout(self.timeout, self.resolve_uncapped(code)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(code, timeout_ms = self.timeout.as_millis() as u64, "Resolution timed out");
                Err(ResolveError::Unavailable("timeout".to_string()))
            }
        }
    }

    async fn resolve_uncapped(&self, code: &str) -> Result<String, ResolveError> {
        if let Some(destination) = self.cache.get(code).await {
            return Ok(destination);
        }

        let link = self
            .link_repository
            .find_by_code(code)
            .await
            .map_err(|e| {
                error!(code, error = %e, "Link lookup failed");
                ResolveError::Unavailable(e.to_string())
            })?
            .ok_or(ResolveError::NotFound)?;

        if !link.is_active {
            debug!(code, "Link is inactive");
            return Err(ResolveError::Inactive);
        }

        if link.is_expired_at(Utc::now()) {
            debug!(code, expires_at = ?link.expires_at, "Link has expired");
            return Err(ResolveError::Expired);
        }

        self.cache.fill(code, &link.destination).await;

        Ok(link.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::sample_link;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{DEFAULT_CACHE_TTL, MemoryStore};
    use axum::http::StatusCode;
    use chrono::Duration as ChronoDuration;

    fn service(repo: MockLinkRepository) -> (RedirectService<MockLinkRepository>, DestinationCache) {
        let cache = DestinationCache::new(Arc::new(MemoryStore::new()), DEFAULT_CACHE_TTL);
        let service = RedirectService::new(Arc::new(repo), cache.clone(), DEFAULT_RESOLVE_TIMEOUT);
        (service, cache)
    }

    #[tokio::test]
    async fn test_miss_reads_store_and_fills_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(sample_link(code, None))));

        let (service, cache) = service(repo);

        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com");
        assert_eq!(
            cache.get("abc123").await,
            Some("https://example.com".to_string())
        );
        // second call is served from cache; the mock allows a single store read
        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let (service, _) = service(repo);

        assert!(matches!(
            service.resolve("nope").await,
            Err(ResolveError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_inactive_link_not_cached() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            let mut link = sample_link(code, None);
            link.is_active = false;
            Ok(Some(link))
        });

        let (service, cache) = service(repo);

        assert!(matches!(
            service.resolve("off").await,
            Err(ResolveError::Inactive)
        ));
        assert_eq!(cache.get("off").await, None);
    }

    #[tokio::test]
    async fn test_expired_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            let mut link = sample_link(code, None);
            link.expires_at = Some(Utc::now() - ChronoDuration::seconds(1));
            Ok(Some(link))
        });

        let (service, _) = service(repo);

        assert!(matches!(
            service.resolve("old").await,
            Err(ResolveError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_lookup_after_invalidation_is_not_cached() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(2)
            .returning(|code| Ok(Some(sample_link(code, None))));

        let (service, cache) = service(repo);
        cache.invalidate("abc123").await;

        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com");
        assert_eq!(cache.get("abc123").await, None);
        assert_eq!(service.resolve("abc123").await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_active_check() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(0);

        let (service, cache) = service(repo);
        cache.set("stale", "https://cached.example.com").await;

        assert_eq!(
            service.resolve("stale").await.unwrap(),
            "https://cached.example.com"
        );
    }

    #[tokio::test]
    async fn test_store_error_is_unavailable() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Err(AppError::unavailable("db down", json!({}))));

        let (service, _) = service(repo);

        let err = service.resolve("abc").await.unwrap_err();
        assert!(matches!(err, ResolveError::Unavailable(_)));
        assert_eq!(AppError::from(err).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_not_found_kinds_share_one_response() {
        let bodies: Vec<String> = [
            ResolveError::NotFound,
            ResolveError::Inactive,
            ResolveError::Expired,
        ]
        .into_iter()
        .map(|e| {
            let app = AppError::from(e);
            assert_eq!(app.status(), StatusCode::NOT_FOUND);
            serde_json::to_string(&app.to_error_info()).unwrap()
        })
        .collect();

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[1], bodies[2]);
    }
}
