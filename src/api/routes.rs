//! API route configuration.
//!
//! Every route here passes caller identification and then rate limiting; see
//! [`crate::routes::app_router`].

use crate::api::handlers::{
    create_link_handler, dashboard_stats_handler, delete_link_handler, get_link_handler,
    list_links_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes mounted under `/api/v1`.
///
/// # Endpoints
///
/// - `POST   /links`            - Create a link (anonymous allowed)
/// - `GET    /links`            - List the caller's links (paginated)
/// - `GET    /links/{code}`     - Get one link
/// - `PUT    /links/{code}`     - Update a link (owner only)
/// - `PATCH  /links/{code}`     - Update a link (owner only)
/// - `DELETE /links/{code}`     - Delete a link (owner only)
/// - `GET    /dashboard/stats`  - Aggregates over the caller's links
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route(
            "/links/{code}",
            get(get_link_handler)
                .put(update_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/dashboard/stats", get(dashboard_stats_handler))
}
