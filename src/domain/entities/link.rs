//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL link with metadata.
///
/// `short_code` is globally unique and never changes after creation.
/// `click_count` only grows, and only the click recording path touches it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub destination: String,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit instant. An expiry equal to `now` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true when `user_id` may read this link.
    ///
    /// Ownerless links are readable by everyone.
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.user_id.is_none_or(|owner| owner == user_id)
    }

    /// Returns true when `user_id` may modify or delete this link.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub destination: String,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub destination: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
            && self.expires_at.is_none()
    }
}

/// One page of a user's links.
#[derive(Debug, Clone)]
pub struct LinkPage {
    pub items: Vec<Link>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
pub(crate) fn sample_link(code: &str, owner: Option<i64>) -> Link {
    let now = Utc::now();
    Link {
        id: 1,
        short_code: code.to_string(),
        destination: "https://example.com".to_string(),
        user_id: owner,
        title: None,
        description: None,
        is_active: true,
        click_count: 0,
        created_at: now,
        updated_at: now,
        expires_at: None,
    }
}
