use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

Backend for a storefront: order lifecycle with checkout and fulfillment
tracking, product catalog, blog content, product reviews and wishlists.

## Authentication

Customer and admin endpoints require a JWT bearer token obtained from
`POST /auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Back-office endpoints under `/api/v1/admin` additionally require the
`admin` role.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20) query
parameters and respond with the total row count and page count.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "orders", description = "Customer order endpoints"),
        (name = "catalog", description = "Public product catalog"),
        (name = "blog", description = "Published blog content"),
        (name = "reviews", description = "Product reviews"),
        (name = "wishlist", description = "Customer wishlist"),
        (name = "admin", description = "Back-office endpoints"),
        (name = "health", description = "Health checks")
    ),
    paths(
        crate::auth::register_handler,
        crate::auth::login_handler,

        crate::handlers::orders::list_my_orders,
        crate::handlers::orders::get_my_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::admin_list_orders,
        crate::handlers::orders::admin_get_order,
        crate::handlers::orders::admin_update_order,

        crate::handlers::products::list_products,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::products::get_product_reviews,
        crate::handlers::products::list_categories,
        crate::handlers::products::admin_list_products,
        crate::handlers::products::admin_create_product,
        crate::handlers::products::admin_update_product,
        crate::handlers::products::admin_delete_product,
        crate::handlers::products::admin_create_category,

        crate::handlers::blog::list_posts,
        crate::handlers::blog::get_post_by_slug,
        crate::handlers::blog::admin_list_posts,
        crate::handlers::blog::admin_create_post,
        crate::handlers::blog::admin_update_post,
        crate::handlers::blog::admin_delete_post,
        crate::handlers::blog::admin_publish_due_posts,

        crate::handlers::reviews::create_review,
        crate::handlers::reviews::admin_list_reviews,
        crate::handlers::reviews::admin_approve_review,
        crate::handlers::reviews::admin_reject_review,

        crate::handlers::wishlist::list_wishlist,
        crate::handlers::wishlist::add_wishlist_item,
        crate::handlers::wishlist::remove_wishlist_item,

        crate::handlers::dashboard::dashboard_summary,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            crate::services::orders::CreateOrderInput,
            crate::services::orders::CreateOrderItemInput,
            crate::services::orders::ShippingDetails,
            crate::services::orders::UpdateOrderStatusInput,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::models::order_status::OrderStatus,
            crate::models::order_status::PaymentStatus,
            crate::models::order_status::DisplayTier,
            crate::money::OrderTotals,
            crate::money::BreakdownLine,

            crate::entities::product::Model,
            crate::entities::category::Model,
            crate::entities::blog_post::Model,
            crate::entities::review::Model,
            crate::entities::wishlist_item::Model,

            crate::services::catalog::CreateProductInput,
            crate::services::catalog::UpdateProductInput,
            crate::services::catalog::CreateCategoryInput,
            crate::services::blog::CreatePostInput,
            crate::services::blog::UpdatePostInput,
            crate::services::blog::PostStatus,
            crate::services::reviews::CreateReviewInput,
            crate::services::wishlist::WishlistEntry,
            crate::services::dashboard::DashboardSummary,

            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::AccessToken,

            crate::handlers::wishlist::AddWishlistItemRequest,
            crate::handlers::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/admin/dashboard"));
    }

    #[test]
    fn admin_list_endpoints_are_documented() {
        let openapi = ApiDocV1::openapi();
        let doc: serde_json::Value = serde_json::to_value(&openapi).unwrap();

        // Every admin collection exposes a documented GET alongside its
        // mutating operations.
        for path in [
            "/api/v1/admin/orders",
            "/api/v1/admin/products",
            "/api/v1/admin/blog",
            "/api/v1/admin/reviews",
        ] {
            assert!(
                doc["paths"][path]["get"].is_object(),
                "missing GET documentation for {}",
                path
            );
        }
    }
}
