//! Link creation, retrieval and ownership-scoped mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use crate::application::services::code_allocator::{
    AllocationError, CodeAllocator, MAX_ALLOCATION_ATTEMPTS,
};
use crate::domain::entities::{Link, LinkPage, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::DestinationCache;
use crate::utils::url_normalizer::normalize_url;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Page size used when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Input for creating a link.
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub destination: String,
    pub custom_slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 timestamp.
    pub expires_at: Option<String>,
}

/// Clamps paging input: page < 1 becomes 1, a size outside 1..=100 becomes 10.
pub fn normalize_paging(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let page_size = page_size
        .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (page, page_size)
}

fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AppError::bad_request(
                "expires_at must be an RFC 3339 timestamp",
                json!({ "field": "expires_at", "reason": e.to_string() }),
            )
        })
}

fn normalize_destination(raw: &str) -> Result<String, AppError> {
    normalize_url(raw).map_err(|e| {
        AppError::bad_request(
            "Invalid URL format",
            json!({ "field": "destination", "reason": e.to_string() }),
        )
    })
}

/// Service for creating and managing shortened links.
///
/// Keeps the destination cache in step with the store: creation pre-warms
/// the entry, and every committed update or delete invalidates it.
pub struct LinkService<L: LinkRepository + ?Sized = dyn LinkRepository> {
    link_repository: Arc<L>,
    allocator: CodeAllocator<L>,
    cache: DestinationCache,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(link_repository: Arc<L>, cache: DestinationCache) -> Self {
        Self {
            allocator: CodeAllocator::new(link_repository.clone()),
            link_repository,
            cache,
        }
    }

    /// Creates an active short link, optionally owned by `owner`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad URL, slug or expiry
    /// - [`AppError::Conflict`] when the custom slug is taken, including a
    ///   concurrent creator winning the insert
    /// - [`AppError::AllocationExhausted`] when no free random code was found,
    ///   or generated codes kept losing insert races
    pub async fn create(&self, input: CreateLink, owner: Option<i64>) -> Result<Link, AppError> {
        let destination = normalize_destination(&input.destination)?;

        let expires_at = match input.expires_at.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_expiry(raw)?),
            _ => None,
        };

        let custom_slug = input
            .custom_slug
            .as_deref()
            .filter(|slug| !slug.trim().is_empty());

        let mut new_link = NewLink {
            short_code: String::new(),
            destination,
            user_id: owner,
            title: input.title,
            description: input.description,
            expires_at,
        };

        let mut inserted = None;
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            new_link.short_code = self.allocator.allocate(custom_slug).await?;

            match self.link_repository.create(new_link.clone()).await {
                Ok(link) => {
                    inserted = Some(link);
                    break;
                }
                Err(AppError::Conflict { .. }) if custom_slug.is_some() => {
                    return Err(AllocationError::SlugTaken(new_link.short_code).into());
                }
                Err(AppError::Conflict { .. }) => {
                    debug!(
                        attempt,
                        code = %new_link.short_code,
                        "Generated code lost insert race, retrying"
                    );
                }
                Err(other) => return Err(other),
            }
        }
        let link =
            inserted.ok_or(AllocationError::AllocationExhausted(MAX_ALLOCATION_ATTEMPTS))?;

        self.cache.set(&link.short_code, &link.destination).await;

        info!(code = %link.short_code, owner = ?owner, "Short link created");
        Ok(link)
    }

    /// Returns a link visible to `user_id`.
    ///
    /// Ownerless links are visible to everyone.
    pub async fn get(&self, code: &str, user_id: i64) -> Result<Link, AppError> {
        let link = self.find(code).await?;

        if !link.is_visible_to(user_id) {
            return Err(AppError::forbidden(
                "You do not have access to this link",
                json!({ "code": code }),
            ));
        }

        Ok(link)
    }

    /// Lists the caller's links, newest first.
    pub async fn list(
        &self,
        user_id: i64,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<LinkPage, AppError> {
        let (page, page_size) = normalize_paging(page, page_size);

        let (items, total) = tokio::try_join!(
            self.link_repository
                .list_by_owner(user_id, page, page_size),
            self.link_repository.count_by_owner(user_id),
        )?;

        Ok(LinkPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Applies a partial update to a link owned by `user_id`.
    ///
    /// The cached destination is invalidated after the update commits, so the
    /// next redirect re-reads active and expiry state from the store.
    pub async fn update(&self, code: &str, user_id: i64, mut patch: LinkPatch) -> Result<Link, AppError> {
        let link = self.find(code).await?;
        Self::ensure_owner(&link, user_id)?;

        if let Some(destination) = patch.destination.take() {
            patch.destination = Some(normalize_destination(&destination)?);
        }

        if patch.is_empty() {
            return Ok(link);
        }

        let affected = self.link_repository.update(code, user_id, patch).await?;
        if affected == 0 {
            return Err(Self::not_found(code));
        }

        self.cache.invalidate(code).await;
        debug!(code, "Short link updated");

        self.find(code).await
    }

    /// Deletes a link owned by `user_id`.
    pub async fn delete(&self, code: &str, user_id: i64) -> Result<(), AppError> {
        let link = self.find(code).await?;
        Self::ensure_owner(&link, user_id)?;

        let affected = self.link_repository.delete_owned(code, user_id).await?;
        if affected == 0 {
            return Err(Self::not_found(code));
        }

        self.cache.invalidate(code).await;
        info!(code, "Short link deleted");
        Ok(())
    }

    async fn find(&self, code: &str) -> Result<Link, AppError> {
        self.link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| Self::not_found(code))
    }

    fn ensure_owner(link: &Link, user_id: i64) -> Result<(), AppError> {
        if link.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the owner can modify this link",
                json!({ "code": link.short_code }),
            ))
        }
    }

    fn not_found(code: &str) -> AppError {
        AppError::not_found("Short link not found", json!({ "code": code }))
    }
}
