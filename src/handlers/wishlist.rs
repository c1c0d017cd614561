use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::wishlist_item;
use crate::services::wishlist::WishlistEntry;
use crate::{auth::AuthUser, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddWishlistItemRequest {
    pub product_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    responses(
        (status = 200, description = "Wishlist retrieved", body = ApiResponse<Vec<WishlistEntry>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<WishlistEntry>>>, ServiceError> {
    let entries = state.services.wishlist.list(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Idempotent add: re-adding a wishlisted product returns the existing row.
#[utoipa::path(
    post,
    path = "/api/v1/wishlist",
    request_body = AddWishlistItemRequest,
    responses(
        (status = 201, description = "Membership present", body = ApiResponse<wishlist_item::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn add_wishlist_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<AddWishlistItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<wishlist_item::Model>>), ServiceError> {
    let item = state
        .services
        .wishlist
        .add(auth_user.user_id, request.product_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/{item_id}",
    params(("item_id" = Uuid, Path, description = "Wishlist item ID")),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Item not found or not yours", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove_wishlist_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state
        .services
        .wishlist
        .remove(auth_user.user_id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(())))
}
