//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new active link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::Unavailable`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code, regardless of active or expiry state.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Returns true when a link with this short code exists.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Lists a user's links, newest first.
    ///
    /// `page` is 1-indexed.
    async fn list_by_owner(
        &self,
        user_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Link>, AppError>;

    async fn count_by_owner(&self, user_id: i64) -> Result<i64, AppError>;

    /// Applies a partial update to a link owned by `user_id`.
    ///
    /// Returns the number of affected rows (0 when the code does not exist or
    /// belongs to someone else).
    async fn update(&self, code: &str, user_id: i64, patch: LinkPatch) -> Result<u64, AppError>;

    /// Deletes a link owned by `user_id`. Returns the number of affected rows.
    async fn delete_owned(&self, code: &str, user_id: i64) -> Result<u64, AppError>;

    /// Adds one to the persisted click counter.
    async fn increment_click_count(&self, id: i64) -> Result<(), AppError>;

    /// Round-trips the database for health reporting.
    async fn ping(&self) -> Result<(), AppError>;
}
