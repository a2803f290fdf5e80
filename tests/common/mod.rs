#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use shortlink::application::services::RateLimitConfig;
use shortlink::domain::click_event::ClickEvent;
use shortlink::domain::entities::{Click, Link, LinkPatch, NewClick, NewLink};
use shortlink::domain::repositories::{
    ApiToken, ClickRepository, DailyCount, DashboardRepository, LinkRepository, TokenRepository,
};
use shortlink::error::AppError;
use shortlink::infrastructure::cache::MemoryStore;
use shortlink::routes::router;
use shortlink::state::{AppState, StateSettings};
use shortlink::utils::token::hash_token;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "https://sho.rt";

pub const ALICE: i64 = 1;
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB: i64 = 2;
pub const BOB_TOKEN: &str = "bob-token";

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// ---------------------------------------------------------------------------
// Connect info
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryLinks {
    links: Mutex<Vec<Link>>,
    next_id: AtomicI64,
    lookup_delay: Mutex<Option<Duration>>,
    stall_after_read: Mutex<Option<Duration>>,
    ping_fails: AtomicBool,
}

impl InMemoryLinks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every `find_by_code` sleep first.
    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    /// Makes the next `find_by_code` hold the row it read for `delay`
    /// before returning it.
    pub fn stall_next_read(&self, delay: Duration) {
        *self.stall_after_read.lock().unwrap() = Some(delay);
    }

    pub fn fail_ping(&self) {
        self.ping_fails.store(true, Ordering::SeqCst);
    }

    pub fn insert(&self, code: &str, destination: &str, owner: Option<i64>) -> Link {
        self.insert_with(code, destination, owner, |_| {})
    }

    pub fn insert_with(
        &self,
        code: &str,
        destination: &str,
        owner: Option<i64>,
        tweak: impl FnOnce(&mut Link),
    ) -> Link {
        let now = Utc::now();
        let mut link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            short_code: code.to_string(),
            destination: destination.to_string(),
            user_id: owner,
            title: None,
            description: None,
            is_active: true,
            click_count: 0,
            created_at: now,
            updated_at: now,
            expires_at: None,
        };
        tweak(&mut link);
        self.links.lock().unwrap().push(link.clone());
        link
    }

    pub fn get(&self, code: &str) -> Option<Link> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.short_code == code)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinks {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.short_code == new_link.short_code) {
            return Err(AppError::conflict(
                "Short code already exists",
                json!({ "code": new_link.short_code }),
            ));
        }

        let now = Utc::now();
        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            short_code: new_link.short_code,
            destination: new_link.destination,
            user_id: new_link.user_id,
            title: new_link.title,
            description: new_link.description,
            is_active: true,
            click_count: 0,
            created_at: now,
            updated_at: now,
            expires_at: new_link.expires_at,
        };
        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let link = self.get(code);
        let stall = self.stall_after_read.lock().unwrap().take();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.get(code).is_some())
    }

    async fn list_by_owner(
        &self,
        user_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Link>, AppError> {
        let mut owned: Vec<Link> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = ((page - 1) * page_size) as usize;
        Ok(owned
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }

    async fn count_by_owner(&self, user_id: i64) -> Result<i64, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == Some(user_id))
            .count() as i64)
    }

    async fn update(&self, code: &str, user_id: i64, patch: LinkPatch) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links
            .iter_mut()
            .find(|l| l.short_code == code && l.user_id == Some(user_id))
        else {
            return Ok(0);
        };

        if let Some(destination) = patch.destination {
            link.destination = destination;
        }
        if let Some(title) = patch.title {
            link.title = Some(title);
        }
        if let Some(description) = patch.description {
            link.description = Some(description);
        }
        if let Some(is_active) = patch.is_active {
            link.is_active = is_active;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        link.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete_owned(&self, code: &str, user_id: i64) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| !(l.short_code == code && l.user_id == Some(user_id)));
        Ok((before - links.len()) as u64)
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        if let Some(link) = self.links.lock().unwrap().iter_mut().find(|l| l.id == id) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(AppError::unavailable("Database unavailable", json!({})));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryClicks {
    clicks: Mutex<Vec<Click>>,
}

impl InMemoryClicks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClickRepository for InMemoryClicks {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut clicks = self.clicks.lock().unwrap();
        let click = Click {
            id: clicks.len() as i64 + 1,
            link_id: new_click.link_id,
            ip_address: new_click.ip_address,
            user_agent: new_click.user_agent,
            referer: new_click.referer,
            country: None,
            city: None,
            device_type: new_click.device_type,
            browser: new_click.browser,
            os: new_click.os,
            clicked_at: Utc::now(),
        };
        clicks.push(click.clone());
        Ok(click)
    }
}

/// Hash-keyed tokens, hashed the same way the server does.
pub struct InMemoryTokens {
    owners: HashMap<String, i64>,
}

impl InMemoryTokens {
    pub fn with_users() -> Arc<Self> {
        let owners = [(ALICE_TOKEN, ALICE), (BOB_TOKEN, BOB)]
            .into_iter()
            .map(|(token, user)| (hash_token(SIGNING_SECRET, token), user))
            .collect();
        Arc::new(Self { owners })
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn find_active_owner(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        Ok(self.owners.get(token_hash).copied())
    }

    async fn update_last_used(&self, _token_hash: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_token(
        &self,
        _user_id: i64,
        _name: &str,
        _token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        Err(AppError::internal("read-only token store", json!({})))
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(None)
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(None)
    }

    async fn revoke_token(&self, _id: i64) -> Result<(), AppError> {
        Err(AppError::not_found("Token not found", json!({})))
    }
}

/// Fixed aggregates, returned for every user.
#[derive(Default, Clone)]
pub struct StaticDashboard {
    pub links: i64,
    pub clicks: i64,
    pub daily: Vec<DailyCount>,
    pub this_week: i64,
    pub last_week: i64,
}

#[async_trait]
impl DashboardRepository for StaticDashboard {
    async fn count_links(&self, _user_id: i64) -> Result<i64, AppError> {
        Ok(self.links)
    }

    async fn sum_clicks(&self, _user_id: i64) -> Result<i64, AppError> {
        Ok(self.clicks)
    }

    async fn daily_visits(
        &self,
        _user_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<DailyCount>, AppError> {
        Ok(self.daily.iter().filter(|d| d.day >= since).copied().collect())
    }

    async fn count_clicks_between(
        &self,
        _user_id: i64,
        _from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        // The current week ends now, the previous one a week ago.
        if Utc::now() - to < chrono::Duration::days(1) {
            Ok(self.this_week)
        } else {
            Ok(self.last_week)
        }
    }
}

// ---------------------------------------------------------------------------
// App builder
// ---------------------------------------------------------------------------

pub fn test_settings() -> StateSettings {
    StateSettings {
        base_url: BASE_URL.to_string(),
        behind_proxy: false,
        rate_limit_per_endpoint: false,
        rate_limit: RateLimitConfig {
            max_requests: 100,
            window: Duration::from_secs(60),
        },
        cache_ttl: Duration::from_secs(3600),
        resolve_timeout: Duration::from_millis(2000),
        token_signing_secret: SIGNING_SECRET.to_string(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub links: Arc<InMemoryLinks>,
    pub store: MemoryStore,
    pub clicks: mpsc::Receiver<ClickEvent>,
    pub state: AppState,
}

pub struct TestAppBuilder {
    links: Arc<InMemoryLinks>,
    dashboard: StaticDashboard,
    settings: StateSettings,
    queue_capacity: usize,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            links: InMemoryLinks::new(),
            dashboard: StaticDashboard::default(),
            settings: test_settings(),
            queue_capacity: 100,
        }
    }

    pub fn links(mut self, links: Arc<InMemoryLinks>) -> Self {
        self.links = links;
        self
    }

    pub fn dashboard(mut self, dashboard: StaticDashboard) -> Self {
        self.dashboard = dashboard;
        self
    }

    pub fn settings(mut self, f: impl FnOnce(&mut StateSettings)) -> Self {
        f(&mut self.settings);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> TestApp {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let state = AppState::new(
            self.links.clone(),
            Arc::new(self.dashboard),
            InMemoryTokens::with_users(),
            Arc::new(store.clone()),
            tx,
            self.settings,
        );

        let app: Router = router(state.clone()).layer(MockConnectInfoLayer);
        let server = TestServer::new(app).unwrap();

        TestApp {
            server,
            links: self.links,
            store,
            clicks: rx,
            state,
        }
    }
}

pub fn test_app() -> TestApp {
    TestAppBuilder::new().build()
}
