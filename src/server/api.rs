use crate::error::AppError;
use crate::models::{StockAnalysis, WishlistPrice};
use crate::server::AppState;
use crate::services::trading_hours::get_cache_max_age;
use crate::services::{write_api_log_entry, ApiPerformanceMetrics};
use crate::utils::normalize_symbol;
use axum::{
    extract::{Path, Query, State},
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Query parameters for /stock-price/{symbol}
#[derive(Debug, Deserialize)]
pub struct StockPriceQuery {
    /// Trailing window in calendar days (default from config)
    pub days: Option<u32>,
}

/// Query parameters for /wishlist-prices
#[derive(Debug, Deserialize)]
pub struct WishlistQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /stock-price/{symbol} - Price history, summary statistics, RSI and MACD
///
/// Examples:
/// - /stock-price/AAPL (default window)
/// - /stock-price/msft?days=90
#[instrument(skip(app_state))]
pub async fn stock_price_handler(
    State(app_state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<StockPriceQuery>,
) -> Result<Response, AppError> {
    let window_days = params.days.unwrap_or(app_state.default_window_days);

    let mut metrics = ApiPerformanceMetrics::new("/stock-price", Utc::now());
    metrics.symbol = normalize_symbol(&symbol);
    metrics.window_days = Some(window_days);

    let result = app_state.analyzer.analyze(&symbol, window_days).await;
    let analysis: StockAnalysis = match result {
        Ok((analysis, series)) => {
            metrics.row_count = series.len();
            metrics.rows_inserted = series.inserted();
            metrics.data_source = Some(series.source());
            metrics.complete();
            write_api_log_entry(&metrics);
            analysis
        }
        Err(e) => {
            metrics.fail(&e);
            metrics.complete();
            write_api_log_entry(&metrics);
            return Err(e);
        }
    };

    let cache_max_age = get_cache_max_age();
    debug!(cache_max_age, "Applied cache control header based on trading hours");

    Ok(([(CACHE_CONTROL, format!("max-age={}", cache_max_age))], Json(analysis)).into_response())
}

/// GET /wishlist-prices?user_id=... - Latest price for every saved symbol
#[instrument(skip(app_state))]
pub async fn wishlist_prices_handler(
    State(app_state): State<AppState>,
    Query(params): Query<WishlistQuery>,
) -> Result<Json<Vec<WishlistPrice>>, AppError> {
    let mut metrics = ApiPerformanceMetrics::new("/wishlist-prices", Utc::now());

    match app_state.wishlist.prices_for_user(&params.user_id).await {
        Ok(prices) => {
            metrics.row_count = prices.len();
            metrics.complete();
            write_api_log_entry(&metrics);
            Ok(Json(prices))
        }
        Err(e) => {
            metrics.fail(&e);
            metrics.complete();
            write_api_log_entry(&metrics);
            Err(e)
        }
    }
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    // No metrics line for /health (too noisy)
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
