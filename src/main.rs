use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

use storefront_api::auth::{auth_routes, AuthConfig, AuthService};
use storefront_api::config::{init_tracing, load_config};
use storefront_api::handlers::AppServices;
use storefront_api::services::{
    BlogService, CatalogService, DashboardService, OrderService, ReviewService, WishlistService,
};
use storefront_api::{api_v1_routes, db, events, handlers, middleware_helpers, openapi, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting storefront-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = db::establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to the database")?;

    if config.auto_migrate {
        db::init_schema(&db_pool)
            .await
            .context("failed to initialize database schema")?;
    }

    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = events::EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx));

    let auth_service = Arc::new(AuthService::new(AuthConfig::from(&config), db_pool.clone()));

    let currency = config.currency_format();
    let services = AppServices {
        orders: Arc::new(OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            currency,
        )),
        catalog: Arc::new(CatalogService::new(db_pool.clone())),
        blog: Arc::new(BlogService::new(db_pool.clone(), event_sender.clone())),
        reviews: Arc::new(ReviewService::new(db_pool.clone(), event_sender.clone())),
        wishlist: Arc::new(WishlistService::new(db_pool.clone())),
        dashboard: Arc::new(DashboardService::new(db_pool.clone())),
    };

    let config = Arc::new(config);
    let state = AppState {
        db: db_pool,
        config: config.clone(),
        event_sender,
        services,
    };

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .route("/health", axum::routing::get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
        .nest(
            "/auth",
            auth_routes().with_state(auth_service.clone()),
        )
        .merge(openapi::swagger_ui())
        .layer(Extension(auth_service))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .layer(storefront_api::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Development gets permissive CORS; production only the configured origins.
fn build_cors_layer(config: &storefront_api::config::AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    if config.should_allow_permissive_cors() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let origin = origin.trim();
            if origin.is_empty() {
                return None;
            }
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        error!("No valid CORS origins configured; cross-origin requests will be rejected");
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
