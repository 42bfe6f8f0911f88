pub mod api;

use crate::config::{AppConfig, CorsOrigins};
use crate::error::{AppError, Result};
use crate::services::{PriceReconciler, SqliteStore, StockAnalyzer, WishlistService, YahooClient};
use axum::{http::HeaderValue, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub analyzer: StockAnalyzer,
    pub wishlist: WishlistService,
    pub default_window_days: u32,
}

impl AppState {
    /// Wire the engine and the wishlist service onto one store and one provider client
    pub fn new(store: Arc<SqliteStore>, yahoo: Arc<YahooClient>, config: &AppConfig) -> Self {
        let reconciler = PriceReconciler::new(store.clone(), yahoo.clone())
            .with_policy(config.freshness)
            .with_fetch_timeout(config.fetch_timeout);

        Self {
            analyzer: StockAnalyzer::new(reconciler),
            wishlist: WishlistService::new(store, yahoo),
            default_window_days: config.default_window_days,
        }
    }
}

pub fn build_cors(origins: &CorsOrigins) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        CorsOrigins::Any => Ok(cors.allow_origin(Any)),
        CorsOrigins::List(list) => {
            let origins = list
                .iter()
                .map(|origin| {
                    origin
                        .parse::<HeaderValue>()
                        .map_err(|e| AppError::Config(format!("invalid CORS origin '{}': {}", origin, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(cors.allow_origin(AllowOrigin::list(origins)))
        }
    }
}

pub fn build_router(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/stock-price/{symbol}", get(api::stock_price_handler))
        .route("/wishlist-prices", get(api::wishlist_prices_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("Starting stockinsight server");

    let store = Arc::new(SqliteStore::new(config.database_path.clone()).await?);
    let yahoo = Arc::new(YahooClient::from_config(&config)?);
    let app_state = AppState::new(store.clone(), yahoo, &config);

    tracing::info!("Registering routes:");
    tracing::info!("  GET /stock-price/{{symbol}}?days={}", config.default_window_days);
    tracing::info!("  GET /wishlist-prices?user_id=...");
    tracing::info!("  GET /health");

    let app = build_router(app_state, build_cors(&config.cors_origins)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
