use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::require_admin;
use crate::entities::{category, product, review};
use crate::services::catalog::{
    CreateCategoryInput, CreateProductInput, ProductFilter, UpdateProductInput,
};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
}

/// Public catalog listing; only active products appear.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("featured" = Option<bool>, Query, description = "Filter by featured flag"),
    ),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<product::Model>>),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let filter = ProductFilter {
        category_id: filter.category_id,
        featured: filter.featured,
        active_only: true,
    };
    let (items, total) = state
        .services
        .catalog
        .list_products(query.page, query.limit, filter)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let product = state.services.catalog.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Approved reviews of a product, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/products/{slug}/reviews",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Reviews retrieved", body = ApiResponse<Vec<review::Model>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product_reviews(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<review::Model>>>, ServiceError> {
    let product = state.services.catalog.get_by_slug(&slug).await?;
    let reviews = state.services.reviews.list_for_product(product.id).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    require_admin(&auth_user)?;
    let product = state.services.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Admin listing, including deactivated products.
#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("featured" = Option<bool>, Query, description = "Filter by featured flag"),
    ),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<product::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    require_admin(&auth_user)?;
    let filter = ProductFilter {
        category_id: filter.category_id,
        featured: filter.featured,
        active_only: false,
    };
    let (items, total) = state
        .services
        .catalog
        .list_products(query.page, query.limit, filter)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_update_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    require_admin(&auth_user)?;
    let product = state.services.catalog.update_product(id, input).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_delete_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    require_admin(&auth_user)?;
    state.services.catalog.delete_product(id).await?;
    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories retrieved", body = ApiResponse<Vec<category::Model>>),
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<category::Model>>>, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<category::Model>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_create_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<ApiResponse<category::Model>>), ServiceError> {
    require_admin(&auth_user)?;
    let category = state.services.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}
