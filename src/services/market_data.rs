//! Market data seams implemented by provider clients

use crate::error::Result;
use crate::models::DailyBar;
use async_trait::async_trait;

/// Daily OHLC history provider
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Bars for the trailing `window_days` calendar days, oldest first.
    /// An empty vector means the symbol is unknown or has no data.
    async fn fetch(&self, symbol: &str, window_days: u32) -> Result<Vec<DailyBar>>;
}

/// Latest traded price provider
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// `None` when the provider has no price for `symbol`
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}
