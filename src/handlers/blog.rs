use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use super::require_admin;
use crate::entities::blog_post;
use crate::services::blog::{CreatePostInput, UpdatePostInput};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

/// Published posts, newest publication first.
#[utoipa::path(
    get,
    path = "/api/v1/blog",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Posts retrieved", body = ApiResponse<PaginatedResponse<blog_post::Model>>),
    ),
    tag = "blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<blog_post::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .blog
        .list_published(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

/// Drafts and scheduled posts are invisible here; they read as 404.
#[utoipa::path(
    get,
    path = "/api/v1/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post retrieved", body = ApiResponse<blog_post::Model>),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    tag = "blog"
)]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<blog_post::Model>>, ServiceError> {
    let post = state.services.blog.get_published_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// Admin listing: every post regardless of status.
#[utoipa::path(
    get,
    path = "/api/v1/admin/blog",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Posts retrieved", body = ApiResponse<PaginatedResponse<blog_post::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_list_posts(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<blog_post::Model>>>, ServiceError> {
    require_admin(&auth_user)?;
    let (items, total) = state.services.blog.list_all(query.page, query.limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/blog",
    request_body = CreatePostInput,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<blog_post::Model>),
        (status = 400, description = "Invalid status or schedule", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<ApiResponse<blog_post::Model>>), ServiceError> {
    require_admin(&auth_user)?;
    let post = state
        .services
        .blog
        .create_post(auth_user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(post))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/blog/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostInput,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<blog_post::Model>),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_update_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<ApiResponse<blog_post::Model>>, ServiceError> {
    require_admin(&auth_user)?;
    let post = state.services.blog.update_post(id, input).await?;
    Ok(Json(ApiResponse::success(post)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/blog/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    require_admin(&auth_user)?;
    state.services.blog.delete_post(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Promote scheduled posts whose time has arrived.
#[utoipa::path(
    post,
    path = "/api/v1/admin/blog/publish-due",
    responses(
        (status = 200, description = "Due posts published", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_publish_due_posts(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    require_admin(&auth_user)?;
    let published = state.services.blog.publish_due_posts().await?;
    Ok(Json(ApiResponse::success(json!({ "published": published }))))
}
