//! HTTP handlers for the review API.
//!
//! Handlers never make policy decisions; they resolve the caller from the
//! bearer token, translate bodies, and let the service rule.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use domains::{Identity, PageRequest, ReviewFilter};
use services::{CreateReviewInput, RatingSummary};

use crate::dto::{
    ListParams, PageParams, PageView, ReplyBody, ReviewView, UpdateReviewBody, VisibilityBody,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Server-side identity resolution: only the verified bearer token is
/// consulted, never client-supplied identity fields.
fn caller(state: &AppState, headers: &HeaderMap) -> Identity {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    state.resolver.resolve(token)
}

fn page_request(state: &AppState, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
    PageRequest::with_limit(
        page.unwrap_or(1),
        page_size.unwrap_or(state.default_page_size),
        state.max_page_size,
    )
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateReviewInput>,
) -> Result<(StatusCode, Json<ReviewView>), ApiError> {
    let identity = caller(&state, &headers);
    let review = state.service.create(&identity, body).await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<PageView>, ApiError> {
    let identity = caller(&state, &headers);
    let page = page_request(&state, params.page, params.page_size);
    let filter = ReviewFilter {
        owner_id: params.owner_id,
        target_key: params.target_key,
        target_type: params.target_type,
        status: params.status,
        search: params.q,
    };
    let result = state.service.list(&identity, filter, page).await?;
    Ok(Json(result.into()))
}

pub async fn list_my_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PageView>, ApiError> {
    let identity = caller(&state, &headers);
    let page = page_request(&state, params.page, params.page_size);
    let result = state.service.list_own(&identity, page).await?;
    Ok(Json(result.into()))
}

pub async fn get_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewView>, ApiError> {
    let identity = caller(&state, &headers);
    let review = state.service.get_visible(&identity, id).await?;
    Ok(Json(review.into()))
}

pub async fn update_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReviewBody>,
) -> Result<Json<ReviewView>, ApiError> {
    let identity = caller(&state, &headers);
    let review = state.service.update(&identity, id, body.into()).await?;
    Ok(Json(review.into()))
}

pub async fn delete_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewView>, ApiError> {
    let identity = caller(&state, &headers);
    let review = state.service.delete_own(&identity, id).await?;
    Ok(Json(review.into()))
}

pub async fn change_visibility(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VisibilityBody>,
) -> Result<Json<ReviewView>, ApiError> {
    let identity = caller(&state, &headers);
    let review = state
        .service
        .change_visibility(&identity, id, body.action)
        .await?;
    Ok(Json(review.into()))
}

pub async fn add_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplyBody>,
) -> Result<Json<ReviewView>, ApiError> {
    let identity = caller(&state, &headers);
    let review = state.service.add_reply(&identity, id, &body.message).await?;
    Ok(Json(review.into()))
}

pub async fn target_summary(
    State(state): State<AppState>,
    Path(target_key): Path<String>,
) -> Result<Json<RatingSummary>, ApiError> {
    let summary = state.service.rating_summary(&target_key).await?;
    Ok(Json(summary))
}
