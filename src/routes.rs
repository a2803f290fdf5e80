//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect (public, not rate limited)
//! - `GET  /health`      - Health check: DB, cache, click queue (public)
//! - `/api/v1/*`         - REST API (identity, then rate limit)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Authentication** - Optional Bearer token, resolved to a caller
//! - **Rate limiting** - Fixed window per user or client IP
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
///
/// Layers added later run first, so on `/api/v1` the caller is identified
/// before the rate limiter picks a `user:` or `ip:` key.
pub fn router(state: AppState) -> Router {
    let api_router = api::routes::api_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::layer,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identify,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api/v1", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
