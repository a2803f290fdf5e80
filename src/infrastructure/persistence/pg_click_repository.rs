//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let click = sqlx::query_as::<_, Click>(
            r#"
            INSERT INTO clicks (link_id, ip_address, user_agent, referer, device_type, browser, os)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, link_id, ip_address, user_agent, referer, country, city,
                      device_type, browser, os, clicked_at
            "#,
        )
        .bind(new_click.link_id)
        .bind(new_click.ip_address)
        .bind(new_click.user_agent)
        .bind(new_click.referer)
        .bind(new_click.device_type)
        .bind(new_click.browser)
        .bind(new_click.os)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(click)
    }
}
