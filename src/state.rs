//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::services::{
    AuthService, DashboardService, LinkService, RateLimitConfig, RateLimiter, RedirectService,
};
use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{DashboardRepository, LinkRepository, TokenRepository};
use crate::infrastructure::cache::{DestinationCache, EphemeralStore};

/// Runtime settings the HTTP layer needs, split from [`Config`] so tests can
/// build state without touching the environment.
#[derive(Debug, Clone)]
pub struct StateSettings {
    pub base_url: String,
    pub behind_proxy: bool,
    pub rate_limit_per_endpoint: bool,
    pub rate_limit: RateLimitConfig,
    pub cache_ttl: Duration,
    pub resolve_timeout: Duration,
    pub token_signing_secret: String,
}

impl StateSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            behind_proxy: config.behind_proxy,
            rate_limit_per_endpoint: config.rate_limit_per_endpoint,
            rate_limit: config.rate_limit(),
            cache_ttl: config.cache_ttl(),
            resolve_timeout: config.resolve_timeout(),
            token_signing_secret: config.token_signing_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub dashboard_service: Arc<DashboardService>,
    pub auth_service: Arc<AuthService>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Used directly only by the health check.
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: DestinationCache,
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub base_url: Arc<str>,
    pub behind_proxy: bool,
    pub rate_limit_per_endpoint: bool,
}

impl AppState {
    /// Wires services over the given repositories and ephemeral store.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        dashboard_repository: Arc<dyn DashboardRepository>,
        token_repository: Arc<dyn TokenRepository>,
        store: Arc<dyn EphemeralStore>,
        click_sender: mpsc::Sender<ClickEvent>,
        settings: StateSettings,
    ) -> Self {
        let cache = DestinationCache::new(store.clone(), settings.cache_ttl);

        Self {
            link_service: Arc::new(LinkService::new(link_repository.clone(), cache.clone())),
            redirect_service: Arc::new(RedirectService::new(
                link_repository.clone(),
                cache.clone(),
                settings.resolve_timeout,
            )),
            dashboard_service: Arc::new(DashboardService::new(dashboard_repository)),
            auth_service: Arc::new(AuthService::new(
                token_repository,
                settings.token_signing_secret,
            )),
            rate_limiter: Arc::new(RateLimiter::new(store, settings.rate_limit)),
            link_repository,
            cache,
            click_sender,
            base_url: settings.base_url.trim_end_matches('/').into(),
            behind_proxy: settings.behind_proxy,
            rate_limit_per_endpoint: settings.rate_limit_per_endpoint,
        }
    }

    /// Public URL for a short code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
