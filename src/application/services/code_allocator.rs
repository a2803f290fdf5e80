//! Collision-safe short code allocation.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{SlugError, generate_code, normalize_custom_slug};

/// Attempts at drawing an unused random code before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    SlugInvalid(#[from] SlugError),
    #[error("Custom slug '{0}' is already taken")]
    SlugTaken(String),
    #[error("Could not allocate a unique short code after {0} attempts")]
    AllocationExhausted(usize),
    #[error("Random source unavailable: {0}")]
    Entropy(String),
    #[error(transparent)]
    Store(AppError),
}

impl From<AllocationError> for AppError {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::SlugInvalid(reason) => {
                AppError::bad_request(reason.to_string(), json!({ "field": "custom_slug" }))
            }
            AllocationError::SlugTaken(slug) => AppError::conflict(
                format!("Custom slug '{}' is already taken", slug),
                json!({ "custom_slug": slug }),
            ),
            AllocationError::AllocationExhausted(attempts) => AppError::allocation_exhausted(
                "Could not allocate a unique short code, please retry",
                json!({ "attempts": attempts }),
            ),
            AllocationError::Entropy(reason) => {
                AppError::internal("Random source unavailable", json!({ "reason": reason }))
            }
            AllocationError::Store(err) => err,
        }
    }
}

/// Picks the short code for a new link.
///
/// Only checks availability; it never writes. The unique constraint on
/// `short_code` still arbitrates between concurrent creators, so callers must
/// treat a conflict at insert time as "taken".
pub struct CodeAllocator<L: LinkRepository + ?Sized = dyn LinkRepository> {
    link_repository: Arc<L>,
}

impl<L: LinkRepository + ?Sized> CodeAllocator<L> {
    pub fn new(link_repository: Arc<L>) -> Self {
        Self { link_repository }
    }

    /// Returns a code that was unused at check time.
    ///
    /// A custom slug that is empty after trimming counts as absent.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::SlugInvalid`] if the slug fails format or reserved-name checks
    /// - [`AllocationError::SlugTaken`] if the slug already exists (no retry)
    /// - [`AllocationError::AllocationExhausted`] after [`MAX_ALLOCATION_ATTEMPTS`] collisions
    /// - [`AllocationError::Store`] if the existence check fails
    pub async fn allocate(&self, custom_slug: Option<&str>) -> Result<String, AllocationError> {
        match custom_slug.filter(|s| !s.trim().is_empty()) {
            Some(slug) => self.claim_slug(slug).await,
            None => self.generate_unique().await,
        }
    }

    async fn claim_slug(&self, slug: &str) -> Result<String, AllocationError> {
        let slug = normalize_custom_slug(slug)?;

        if self
            .link_repository
            .code_exists(&slug)
            .await
            .map_err(AllocationError::Store)?
        {
            return Err(AllocationError::SlugTaken(slug));
        }

        Ok(slug)
    }

    async fn generate_unique(&self) -> Result<String, AllocationError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let code = generate_code().map_err(|e| AllocationError::Entropy(e.to_string()))?;

            if !self
                .link_repository
                .code_exists(&code)
                .await
                .map_err(AllocationError::Store)?
            {
                return Ok(code);
            }

            debug!(attempt, code = %code, "Generated code collided, retrying");
        }

        warn!(
            attempts = MAX_ALLOCATION_ATTEMPTS,
            "Short code allocation exhausted"
        );
        Err(AllocationError::AllocationExhausted(MAX_ALLOCATION_ATTEMPTS))
    }
}
