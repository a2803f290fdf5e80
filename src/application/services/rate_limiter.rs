//! Fixed-window request counting per identity.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::identity::RateIdentity;
use crate::infrastructure::cache::{CacheError, EphemeralStore};

/// Verdict for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

/// Limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Counter-based fixed-window limiter over an [`EphemeralStore`].
///
/// Each window is a key `ratelimit:{identity}` (or
/// `ratelimit:{identity}:{endpoint}`) whose count resets entirely when the key
/// expires. The window starts with the increment that creates the key. Up to
/// twice the limit can pass across a window boundary, and a GET/INCR race can
/// admit one extra request.
///
/// Store errors fail open: the request is allowed and the error logged.
pub struct RateLimiter {
    store: Arc<dyn EphemeralStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn EphemeralStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn key(identity: &RateIdentity, endpoint: Option<&str>) -> String {
        match endpoint {
            Some(endpoint) => format!("ratelimit:{}:{}", identity, endpoint),
            None => format!("ratelimit:{}", identity),
        }
    }

    /// Counts this request against the identity's current window.
    pub async fn check(&self, identity: &RateIdentity, endpoint: Option<&str>) -> RateDecision {
        let key = Self::key(identity, endpoint);

        match self.try_check(&key).await {
            Ok(decision) => {
                if decision == RateDecision::Limited {
                    debug!(key = %key, "Rate limit exceeded");
                }
                decision
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Rate limiter store unavailable, allowing request");
                metrics::counter!("rate_limit_degraded_total").increment(1);
                RateDecision::Allowed
            }
        }
    }

    async fn try_check(&self, key: &str) -> Result<RateDecision, CacheError> {
        let current = match self.store.get(key).await? {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or(0),
            None => 0,
        };

        if current >= i64::from(self.config.max_requests) {
            return Ok(RateDecision::Limited);
        }

        // The expiry is attached in the same step as the increment, so a
        // counter can never outlive its window.
        self.store.incr_window(key, self.config.window).await?;

        Ok(RateDecision::Allowed)
    }
}
