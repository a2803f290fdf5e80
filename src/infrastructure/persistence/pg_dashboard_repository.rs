//! PostgreSQL implementation of dashboard aggregates.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{DailyCount, DashboardRepository};
use crate::error::AppError;

/// Aggregate queries over `short_links` and `clicks`, scoped by owner.
pub struct PgDashboardRepository {
    pool: Arc<PgPool>,
}

impl PgDashboardRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    async fn count_links(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn sum_clicks(&self, user_id: i64) -> Result<i64, AppError> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(click_count), 0)::BIGINT FROM short_links WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(sum)
    }

    async fn daily_visits(
        &self,
        user_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<DailyCount>, AppError> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT (c.clicked_at AT TIME ZONE 'UTC')::date AS day,
                   COUNT(*)::BIGINT AS visits
            FROM clicks c
            JOIN short_links l ON l.id = c.link_id
            WHERE l.user_id = $1
              AND (c.clicked_at AT TIME ZONE 'UTC')::date >= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn count_clicks_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM clicks c
            JOIN short_links l ON l.id = c.link_id
            WHERE l.user_id = $1
              AND c.clicked_at >= $2
              AND c.clicked_at < $3
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
