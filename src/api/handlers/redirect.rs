//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{Extensions, HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short code to its destination.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code through the destination cache, falling back to the store
/// 2. Offer a click event to the background worker without waiting
/// 3. Return 302 Found
///
/// # Click Tracking
///
/// Click events are sent to a bounded channel for async processing.
/// If the queue is full or closed, the click is dropped and counted; the
/// redirect is never delayed or failed by click recording.
///
/// # Errors
///
/// - 404 Not Found if the code is unknown, inactive or expired (one body for all three)
/// - 503 Service Unavailable if the store fails or the resolution budget elapses
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Result<impl IntoResponse, AppError> {
    let destination = match state.redirect_service.resolve(&code).await {
        Ok(destination) => destination,
        Err(e) => {
            debug!(code = %code, reason = %e, "Redirect not served");
            metrics::counter!("redirects_total", "outcome" => e.outcome()).increment(1);
            return Err(e.into());
        }
    };

    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let click_event = ClickEvent::new(
        code,
        client_ip(&headers, peer, state.behind_proxy),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    if let Err(e) = state.click_sender.try_send(click_event) {
        let reason = match e {
            TrySendError::Full(_) => "queue_full",
            TrySendError::Closed(_) => "queue_closed",
        };
        warn!(reason, "Click event dropped");
        metrics::counter!("click_events_dropped_total", "reason" => reason).increment(1);
    }

    metrics::counter!("redirects_total", "outcome" => "redirected").increment(1);

    Ok((StatusCode::FOUND, [(header::LOCATION, destination)]))
}
