//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, short_code, destination, user_id, title, description, \
     is_active, click_count, created_at, updated_at, expires_at";

/// PostgreSQL repository for link storage and retrieval.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO short_links (short_code, destination, user_id, title, description, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(&new_link.short_code)
            .bind(&new_link.destination)
            .bind(new_link.user_id)
            .bind(&new_link.title)
            .bind(&new_link.description)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM short_links WHERE short_code = $1");

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM short_links WHERE id = $1");

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM short_links WHERE short_code = $1)")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn list_by_owner(
        &self,
        user_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Link>, AppError> {
        let offset = (page - 1) * page_size;
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let links = sqlx::query_as::<_, Link>(&sql)
            .bind(user_id)
            .bind(page_size)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(links)
    }

    async fn count_by_owner(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn update(&self, code: &str, user_id: i64, patch: LinkPatch) -> Result<u64, AppError> {
        let (set_expiry, expires_at) = match patch.expires_at {
            Some(value) => (true, value),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET destination = COALESCE($3, destination),
                title       = COALESCE($4, title),
                description = COALESCE($5, description),
                is_active   = COALESCE($6, is_active),
                expires_at  = CASE WHEN $7 THEN $8 ELSE expires_at END,
                updated_at  = NOW()
            WHERE short_code = $1 AND user_id = $2
            "#,
        )
        .bind(code)
        .bind(user_id)
        .bind(patch.destination)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.is_active)
        .bind(set_expiry)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_owned(&self, code: &str, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM short_links WHERE short_code = $1 AND user_id = $2")
            .bind(code)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE short_links SET click_count = click_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
