//! DTOs for link creation and retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{Link, LinkPage};

/// Request body for `POST /api/v1/links`.
///
/// `destination` may omit the scheme (`https://` is assumed). `custom_slug` is
/// checked and lowercased by the code allocator; `expires_at` is RFC 3339.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[serde(alias = "url")]
    #[validate(length(min = 1, max = 2048, message = "destination must be 1-2048 characters"))]
    pub destination: String,

    pub custom_slug: Option<String>,

    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub expires_at: Option<String>,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        CreateLink {
            destination: req.destination,
            custom_slug: req.custom_slug,
            title: req.title,
            description: req.description,
            expires_at: req.expires_at,
        }
    }
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub destination: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub click_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn from_link(link: Link, short_url: String) -> Self {
        Self {
            short_code: link.short_code,
            short_url,
            destination: link.destination,
            title: link.title,
            description: link.description,
            is_active: link.is_active,
            click_count: link.click_count,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Paginated list of the caller's links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl LinkListResponse {
    pub fn from_page(page: LinkPage, short_url: impl Fn(&str) -> String) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|link| {
                    let url = short_url(&link.short_code);
                    LinkResponse::from_link(link, url)
                })
                .collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_alias_accepted() {
        let req: CreateLinkRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(req.destination, "https://example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_destination_rejected() {
        let req: CreateLinkRequest = serde_json::from_str(r#"{"destination": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_long_title_rejected() {
        let req = CreateLinkRequest {
            destination: "https://example.com".to_string(),
            custom_slug: None,
            title: Some("x".repeat(256)),
            description: None,
            expires_at: None,
        };
        assert!(req.validate().is_err());
    }
}
