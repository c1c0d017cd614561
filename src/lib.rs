//! Storefront API Library
//!
//! Order lifecycle, product catalog, blog content, reviews and wishlists
//! behind a JSON HTTP API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod models;
pub mod money;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::DbPool;

/// Shared application state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    // Customer-facing routes. Ownership is enforced inside the services,
    // not here.
    let customer = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_my_orders).post(handlers::orders::create_order),
        )
        .route("/orders/:id", get(handlers::orders::get_my_order))
        .route(
            "/wishlist",
            get(handlers::wishlist::list_wishlist).post(handlers::wishlist::add_wishlist_item),
        )
        .route(
            "/wishlist/:item_id",
            delete(handlers::wishlist::remove_wishlist_item),
        )
        .route("/reviews", post(handlers::reviews::create_review));

    // Public reads, no token required.
    let public = Router::new()
        .route("/products", get(handlers::products::list_products))
        .route("/products/:slug", get(handlers::products::get_product_by_slug))
        .route(
            "/products/:slug/reviews",
            get(handlers::products::get_product_reviews),
        )
        .route("/categories", get(handlers::products::list_categories))
        .route("/blog", get(handlers::blog::list_posts))
        .route("/blog/:slug", get(handlers::blog::get_post_by_slug));

    // Back office. Every handler checks the admin role before touching a
    // service.
    let admin = Router::new()
        .route("/orders", get(handlers::orders::admin_list_orders))
        .route(
            "/orders/:id",
            get(handlers::orders::admin_get_order).patch(handlers::orders::admin_update_order),
        )
        .route(
            "/products",
            get(handlers::products::admin_list_products)
                .post(handlers::products::admin_create_product),
        )
        .route(
            "/products/:id",
            patch(handlers::products::admin_update_product)
                .delete(handlers::products::admin_delete_product),
        )
        .route(
            "/categories",
            post(handlers::products::admin_create_category),
        )
        .route(
            "/blog",
            get(handlers::blog::admin_list_posts).post(handlers::blog::admin_create_post),
        )
        .route(
            "/blog/publish-due",
            post(handlers::blog::admin_publish_due_posts),
        )
        .route(
            "/blog/:id",
            patch(handlers::blog::admin_update_post).delete(handlers::blog::admin_delete_post),
        )
        .route("/reviews", get(handlers::reviews::admin_list_reviews))
        .route(
            "/reviews/:id/approve",
            post(handlers::reviews::admin_approve_review),
        )
        .route(
            "/reviews/:id",
            delete(handlers::reviews::admin_reject_review),
        )
        .route("/dashboard", get(handlers::dashboard::dashboard_summary));

    Router::new()
        .merge(customer)
        .merge(public)
        .nest("/admin", admin)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }

    #[test]
    fn pagination_rounds_page_count_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let exact = PaginatedResponse::<i32>::new(vec![], 40, 2, 20);
        assert_eq!(exact.total_pages, 2);

        let zero_limit = PaginatedResponse::<i32>::new(vec![], 5, 1, 0);
        assert_eq!(zero_limit.limit, 1);
        assert_eq!(zero_limit.total_pages, 5);
    }
}
