//! Fixed-window rate limiting for API routes.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::application::services::RateDecision;
use crate::domain::identity::{Caller, RateIdentity};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Counts the request against the caller's window.
///
/// Must run after [`super::auth::identify`] so an authenticated caller is
/// limited as `user:{id}` rather than by IP.
///
/// # Key Extraction
///
/// - Authenticated: `user:{id}`
/// - Anonymous: `ip:{addr}`, from the peer address, or from `X-Forwarded-For` /
///   `X-Real-IP` when the service runs behind a trusted proxy
///
/// With per-endpoint limiting enabled, the matched route template (for example
/// `/api/v1/links/{code}`) is appended to the key. Requests whose token fails
/// authentication are counted by IP in [`super::auth::identify`].
///
/// # Errors
///
/// Returns `429 Too Many Requests` with `Retry-After` set to the window length.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<Caller>()
        .copied()
        .unwrap_or(Caller::Anonymous);

    enforce(&st, caller, req.headers(), req.extensions()).await?;

    Ok(next.run(req).await)
}

/// Counts one request for `caller` and rejects it once the window is full.
pub(crate) async fn enforce(
    st: &AppState,
    caller: Caller,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> Result<(), AppError> {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(headers, peer, st.behind_proxy);
    let identity = RateIdentity::resolve(caller, ip.as_deref());

    let endpoint = if st.rate_limit_per_endpoint {
        extensions
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string())
    } else {
        None
    };

    match st.rate_limiter.check(&identity, endpoint.as_deref()).await {
        RateDecision::Allowed => Ok(()),
        RateDecision::Limited => {
            debug!(identity = %identity, endpoint = ?endpoint, "Request rate limited");
            metrics::counter!("rate_limit_rejections_total").increment(1);
            Err(AppError::rate_limited(
                st.rate_limiter.config().window.as_secs().max(1),
            ))
        }
    }
}
