//! Click entity representing a single redirect event.

use chrono::{DateTime, Utc};

/// A click recorded when a shortened link is followed.
///
/// `device_type`, `browser` and `os` are derived from the user agent at
/// recording time. `country` and `city` are reserved for geolocation and stay
/// empty unless an upstream enricher fills them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub clicked_at: DateTime<Utc>,
}

/// Input data for recording a new click.
///
/// `link_id` must reference an existing link. The timestamp is set by the database.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub os: String,
}
