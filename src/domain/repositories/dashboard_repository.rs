//! Read-only aggregate queries backing the dashboard.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Visits on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub visits: i64,
}

/// Aggregates scoped to a single owner.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDashboardRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn count_links(&self, user_id: i64) -> Result<i64, AppError>;

    /// Sum of the persisted per-link click counters.
    async fn sum_clicks(&self, user_id: i64) -> Result<i64, AppError>;

    /// Click counts grouped by UTC day for days on or after `since`.
    ///
    /// Days without clicks are absent from the result.
    async fn daily_visits(
        &self,
        user_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<DailyCount>, AppError>;

    /// Number of clicks with `from <= clicked_at < to`.
    async fn count_clicks_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError>;
}
