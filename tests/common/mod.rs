use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::{auth_routes, AuthConfig, AuthService, Claims, ROLE_ADMIN, ROLE_CUSTOMER},
    config::AppConfig,
    db,
    entities::{product, user},
    events::{self, EventSender},
    handlers::AppServices,
    services::catalog::CreateProductInput,
    services::{
        BlogService, CatalogService, DashboardService, OrderService, ReviewService,
        WishlistService,
    },
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Harness spinning up the full router over an in-memory SQLite database
/// with one seeded admin and one seeded customer.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub customer_id: Uuid,
    admin_token: String,
    customer_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single pooled connection keeps the in-memory database alive and
        // visible to every query.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::init_schema(&pool)
            .await
            .expect("failed to create test schema");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg), pool.clone()));

        let services = AppServices {
            orders: Arc::new(OrderService::new(
                pool.clone(),
                event_sender.clone(),
                cfg.currency_format(),
            )),
            catalog: Arc::new(CatalogService::new(pool.clone())),
            blog: Arc::new(BlogService::new(pool.clone(), event_sender.clone())),
            reviews: Arc::new(ReviewService::new(pool.clone(), event_sender.clone())),
            wishlist: Arc::new(WishlistService::new(pool.clone())),
            dashboard: Arc::new(DashboardService::new(pool.clone())),
        };

        let admin_id = seed_user(&pool, "Admin", "admin@example.com", ROLE_ADMIN).await;
        let customer_id = seed_user(&pool, "Customer", "customer@example.com", ROLE_CUSTOMER).await;

        let state = AppState {
            db: pool,
            config: Arc::new(cfg),
            event_sender,
            services,
        };

        let admin_token = mint_token(admin_id, "admin@example.com", ROLE_ADMIN);
        let customer_token = mint_token(customer_id, "customer@example.com", ROLE_CUSTOMER);

        let router = Router::new()
            .route(
                "/health",
                get(storefront_api::handlers::health::health_check),
            )
            .nest("/api/v1", storefront_api::api_v1_routes())
            .with_state(state.clone())
            .nest("/auth", auth_routes().with_state(auth_service.clone()))
            .layer(Extension(auth_service));

        Self {
            router,
            state,
            admin_id,
            customer_id,
            admin_token,
            customer_token,
            _event_task: event_task,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn customer_token(&self) -> &str {
        &self.customer_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn as_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.admin_token()))
            .await
    }

    pub async fn as_customer(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.customer_token()))
            .await
    }

    /// Insert a second customer and return their id and token.
    pub async fn seed_other_customer(&self) -> (Uuid, String) {
        let email = format!("other-{}@example.com", Uuid::new_v4().simple());
        let id = seed_user(&self.state.db, "Other Customer", &email, ROLE_CUSTOMER).await;
        (id, mint_token(id, &email, ROLE_CUSTOMER))
    }

    pub async fn seed_product(&self, name: &str, sku: &str, price: Decimal) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                slug: None,
                description: Some("Seeded for integration tests".to_string()),
                sku: sku.to_string(),
                price,
                category_id: None,
                images: vec![],
                is_active: true,
                is_featured: false,
            })
            .await
            .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn seed_user(db: &db::DbPool, name: &str, email: &str, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        // Tokens are minted directly in tests, so no real hash is needed.
        password_hash: Set("unused".to_string()),
        role: Set(role.to_string()),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user for tests");
    id
}

fn mint_token(user_id: Uuid, email: &str, role: &str) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        role: role.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
        iss: "storefront-auth".to_string(),
        aud: "storefront-api".to_string(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("encode access token")
}

/// Collect a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
