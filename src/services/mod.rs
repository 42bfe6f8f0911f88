pub mod analyzer;
pub mod api_logging;
pub mod database;
pub mod freshness;
pub mod market_data;
pub mod market_stats;
pub mod price_store;
pub mod reconciler;
pub mod trading_hours;
pub mod wishlist;
pub mod yahoo;

#[cfg(test)]
pub mod test_support;

pub use analyzer::{build_analysis, StockAnalyzer};
pub use api_logging::{write_api_log_entry, ApiPerformanceMetrics, ApiStatus};
pub use database::{DatabaseStats, SqliteStore, SymbolSummary};
pub use freshness::FreshnessPolicy;
pub use market_data::{MarketDataSource, QuoteSource};
pub use market_stats::PriceSummary;
pub use price_store::{PriceStore, WishlistStore};
pub use reconciler::PriceReconciler;
pub use trading_hours::{get_cache_max_age, is_trading_hours};
pub use wishlist::WishlistService;
pub use yahoo::{SharedRateLimiter, YahooClient};
