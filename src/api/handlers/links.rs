//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, LinkListResponse, LinkResponse};
use crate::api::dto::pagination::PaginationParams;
use crate::api::dto::update_link::UpdateLinkRequest;
use crate::api::middleware::auth::AuthUser;
use crate::domain::identity::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// Anonymous callers may create links; those links have no owner and cannot
/// be modified through the API afterwards.
///
/// # Request Body
///
/// ```json
/// {
///   "destination": "example.com/landing",
///   "custom_slug": "promo",                  // optional
///   "title": "Spring campaign",              // optional
///   "expires_at": "2026-12-31T23:59:59Z"     // optional
/// }
/// ```
///
/// # Errors
///
/// - 400 on an invalid body, URL, slug or expiry
/// - 409 if the custom slug is taken
/// - 503 if no free random code could be allocated
pub async fn create_link_handler(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .create(payload.into(), caller.user_id())
        .await?;

    let short_url = state.short_url(&link.short_code);

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(link, short_url)),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/v1/links?page=1&page_size=10`
///
/// `page` below 1 is treated as 1; `page_size` outside 1..=100 falls back to 10.
pub async fn list_links_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<LinkListResponse>, AppError> {
    let Query(params) = params?;

    let page = state
        .link_service
        .list(user_id, params.page, params.page_size)
        .await?;

    Ok(Json(LinkListResponse::from_page(page, |code| {
        state.short_url(code)
    })))
}

/// Returns one link.
///
/// # Endpoint
///
/// `GET /api/v1/links/{code}`
///
/// # Errors
///
/// - 404 if the code does not exist
/// - 403 if the link belongs to another user
pub async fn get_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get(&code, user_id).await?;
    let short_url = state.short_url(&link.short_code);

    Ok(Json(LinkResponse::from_link(link, short_url)))
}

/// Partially updates a link owned by the caller.
///
/// # Endpoint
///
/// `PUT /api/v1/links/{code}` or `PATCH /api/v1/links/{code}`
///
/// # Request Body
///
/// All fields are optional. Only provided fields are changed.
///
/// ```json
/// {
///   "destination": "https://new-destination.com",
///   "is_active": false,
///   "expires_at": null   // clears the expiry
/// }
/// ```
///
/// # Cache
///
/// The cached destination is invalidated once the update commits, so the next
/// redirect re-reads the link.
///
/// # Errors
///
/// - 404 if the code does not exist
/// - 403 if the link has no owner or another owner
/// - 400 if validation fails
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .update(&code, user_id, payload.into())
        .await?;

    let short_url = state.short_url(&link.short_code);

    Ok(Json(LinkResponse::from_link(link, short_url)))
}

/// Deletes a link owned by the caller.
///
/// # Endpoint
///
/// `DELETE /api/v1/links/{code}`
///
/// The link and its click history are removed; the cached destination is
/// invalidated immediately.
///
/// # Errors
///
/// - 404 if the code does not exist
/// - 403 if the link has no owner or another owner
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&code, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
