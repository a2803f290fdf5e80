//! Click event model for asynchronous click tracking.

/// An in-memory click event handed from the redirect handler to the click worker.
///
/// Carries only what the request knew: the short code and the client metadata.
/// The link id is resolved authoritatively by the recorder, never trusted from
/// the cache.
///
/// # Usage Flow
///
/// 1. Built in the redirect handler from request headers
/// 2. `try_send` onto the bounded click channel (never awaited)
/// 3. Drained by [`crate::domain::click_worker::run_click_worker`]
/// 4. Recorded by [`crate::application::services::ClickRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl ClickEvent {
    pub fn new(
        code: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            code,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referer: referer.map(|s| s.to_string()),
        }
    }
}
