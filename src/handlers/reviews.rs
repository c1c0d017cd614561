use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::require_admin;
use crate::entities::review;
use crate::services::reviews::CreateReviewInput;
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewListQuery {
    #[serde(default)]
    pub pending: bool,
}

/// Submit a review. It stays invisible to the public until approved.
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = CreateReviewInput,
    responses(
        (status = 201, description = "Review submitted", body = ApiResponse<review::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateReviewInput>,
) -> Result<(StatusCode, Json<ApiResponse<review::Model>>), ServiceError> {
    let review = state
        .services
        .reviews
        .create_review(auth_user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}

/// Admin: moderation queue (`?pending=true`) or every review.
#[utoipa::path(
    get,
    path = "/api/v1/admin/reviews",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("pending" = Option<bool>, Query, description = "Only unapproved reviews"),
    ),
    responses(
        (status = 200, description = "Reviews retrieved", body = ApiResponse<PaginatedResponse<review::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_list_reviews(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<review::Model>>>, ServiceError> {
    require_admin(&auth_user)?;
    let (items, total) = state
        .services
        .reviews
        .list_reviews(query.page, query.limit, filter.pending)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/reviews/{id}/approve",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review approved", body = ApiResponse<review::Model>),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_approve_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<review::Model>>, ServiceError> {
    require_admin(&auth_user)?;
    let review = state.services.reviews.approve_review(id).await?;
    Ok(Json(ApiResponse::success(review)))
}

/// Rejection deletes the review outright.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review rejected"),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_reject_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    require_admin(&auth_user)?;
    state.services.reviews.reject_review(id).await?;
    Ok(Json(ApiResponse::success(())))
}
