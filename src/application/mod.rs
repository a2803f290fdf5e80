//! Application layer services implementing business logic.
//!
//! Services consume repository traits and the ephemeral store, and expose the
//! operations HTTP handlers and the click worker call into.
//!
//! # Available Services
//!
//! - [`services::code_allocator::CodeAllocator`] - Short code selection
//! - [`services::link_service::LinkService`] - Link creation and owner-scoped management
//! - [`services::redirect_service::RedirectService`] - Cache-aside code resolution
//! - [`services::click_recorder::ClickRecorder`] - Best-effort click persistence
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window request limiting
//! - [`services::dashboard_service::DashboardService`] - Per-user aggregates
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
