//! Repository trait for click persistence.

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;
use async_trait::async_trait;

/// Append-only store of clicks.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Inserts a click row.
    ///
    /// # Errors
    ///
    /// Fails when the referenced link no longer exists (deleted concurrently)
    /// or the database is unreachable.
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError>;
}
