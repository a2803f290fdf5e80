//! Handler for the dashboard statistics endpoint.

use axum::{Json, extract::State};

use crate::api::dto::dashboard::DashboardStatsResponse;
use crate::api::middleware::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns aggregates over the caller's links.
///
/// # Endpoint
///
/// `GET /api/v1/dashboard/stats`
///
/// # Response
///
/// ```json
/// {
///   "total_links": 4,
///   "total_visits": 30,
///   "avg_clicks_per_link": 7.5,
///   "daily_visits": [{"date": "2024-03-04", "visits": 0}, ...],
///   "visits_this_week": 15,
///   "visits_last_week": 10,
///   "visits_growth": 50.0
/// }
/// ```
pub async fn dashboard_stats_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardStatsResponse>, AppError> {
    let stats = state.dashboard_service.stats(user_id).await?;

    Ok(Json(stats.into()))
}
