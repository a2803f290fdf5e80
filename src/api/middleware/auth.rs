//! Bearer token identification and caller extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use super::rate_limit;
use crate::domain::identity::Caller;
use crate::{error::AppError, state::AppState};

/// Resolves the caller and stores it as a [`Caller`] request extension.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// A request without an `Authorization` header continues as
/// [`Caller::Anonymous`]; handlers that need a user reject it through the
/// [`AuthUser`] extractor.
///
/// # Errors
///
/// Returns `401 Unauthorized` (with `WWW-Authenticate: Bearer`) if the header
/// is present but malformed, or the token is unknown or revoked. Such a
/// request is first counted against the client IP's rate-limit window and
/// gets `429` instead once that window is full.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/links", post(create_link_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::identify));
/// ```
pub async fn identify(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let caller = if parts.headers.contains_key(header::AUTHORIZATION) {
        match authenticate(&st, &mut parts).await {
            Ok(user_id) => Caller::User(user_id),
            Err(e) => {
                // Failed attempts still spend the client's budget.
                rate_limit::enforce(&st, Caller::Anonymous, &parts.headers, &parts.extensions)
                    .await?;
                return Err(e);
            }
        }
    } else {
        Caller::Anonymous
    };

    parts.extensions.insert(caller);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn authenticate(st: &AppState, parts: &mut Parts) -> Result<i64, AppError> {
    let AuthBearer(token) = AuthBearer::from_request_parts(parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    st.auth_service.authenticate(&token).await
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Caller>()
            .copied()
            .unwrap_or(Caller::Anonymous))
    }
}

/// Extractor for endpoints that require an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Caller>() {
            Some(Caller::User(id)) => Ok(AuthUser(*id)),
            _ => Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authentication required"}),
            )),
        }
    }
}
