//! Price-series reconciliation
//!
//! Serves a symbol's trailing window from the store when it is fresh enough,
//! otherwise fetches the window from the market data source, persists only
//! the days the store has never seen and merges the two.

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, MAX_WINDOW_DAYS};
use crate::error::{AppError, Result};
use crate::models::{DataSource, PriceRow, ReconciledSeries};
use crate::services::freshness::FreshnessPolicy;
use crate::services::market_data::MarketDataSource;
use crate::services::price_store::PriceStore;
use crate::utils::deduplication::DateDeduplicator;
use crate::utils::normalize_symbol;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct PriceReconciler {
    store: Arc<dyn PriceStore>,
    source: Arc<dyn MarketDataSource>,
    policy: FreshnessPolicy,
    fetch_timeout: Duration,
}

impl PriceReconciler {
    pub fn new(store: Arc<dyn PriceStore>, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            store,
            source,
            policy: FreshnessPolicy::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Reconcile the trailing `window_days` ending today (UTC)
    pub async fn reconcile(&self, symbol: &str, window_days: u32) -> Result<ReconciledSeries> {
        self.reconcile_as_of(symbol, window_days, Utc::now().date_naive()).await
    }

    pub async fn reconcile_as_of(&self, symbol: &str, window_days: u32, today: NaiveDate) -> Result<ReconciledSeries> {
        let symbol = normalize_symbol(symbol).ok_or_else(|| AppError::InvalidInput("symbol must not be empty".to_string()))?;
        validate_window(window_days)?;

        let start_date = today - ChronoDuration::days(window_days as i64);
        let stored = self.store.query(&symbol, Some(start_date)).await?;

        if self.policy.is_fresh(stored.len(), window_days, today) {
            debug!(
                symbol = %symbol,
                rows = stored.len(),
                "Stored window is fresh, skipping remote fetch"
            );
            return Ok(ReconciledSeries::from_rows(symbol, stored, DataSource::Cache));
        }

        info!(
            symbol = %symbol,
            stored = stored.len(),
            required = self.policy.min_rows(window_days, today),
            window_days,
            "Stored window is stale, fetching from market data source"
        );

        let fetched = tokio::time::timeout(self.fetch_timeout, self.source.fetch(&symbol, window_days))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "market data fetch for {} exceeded {:?}",
                    symbol, self.fetch_timeout
                ))
            })??;

        if fetched.is_empty() {
            return Err(AppError::NotFound(format!("no price data for symbol {}", symbol)));
        }

        // Every stored date, not only the window, so old rows are never re-sent
        let existing = self.store.query(&symbol, None).await?;
        let mut deduplicator = DateDeduplicator::with_existing(&symbol, existing.iter().map(|r| r.date));

        let mut skipped = 0;
        let mut new_rows: Vec<PriceRow> = Vec::new();
        for bar in &fetched {
            if !bar.close.is_finite() {
                skipped += 1;
                continue;
            }
            let row = PriceRow::new(symbol.as_str(), bar.date, bar.close);
            if !deduplicator.is_duplicate(&row) {
                new_rows.push(row);
            }
        }
        if skipped > 0 {
            warn!(symbol = %symbol, skipped, "Skipped fetched days with non-finite close");
        }

        let inserted = if new_rows.is_empty() {
            0
        } else {
            self.store.insert(&new_rows).await?
        };

        info!(
            symbol = %symbol,
            fetched = fetched.len(),
            new_rows = new_rows.len(),
            inserted,
            "Reconciled price window"
        );

        let mut merged = stored;
        merged.extend(new_rows);
        Ok(ReconciledSeries::from_rows(symbol, merged, DataSource::Remote).with_inserted(inserted))
    }
}

/// Reject a zero or oversized window
pub fn validate_window(window_days: u32) -> Result<()> {
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(AppError::InvalidInput(format!(
            "days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS, window_days
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyBar;
    use crate::services::test_support::{bars_for, days_from, rows_for, FakeSource, MemoryStore};
    use std::sync::atomic::Ordering;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - ChronoDuration::days(n)
    }

    fn reconciler(store: &Arc<MemoryStore>, source: &Arc<FakeSource>) -> PriceReconciler {
        PriceReconciler::new(store.clone(), source.clone())
    }

    fn assert_strictly_increasing(series: &ReconciledSeries) {
        let dates = series.dates();
        assert!(dates.windows(2).all(|w| w[0] < w[1]), "dates not strictly increasing: {:?}", dates);
    }

    #[tokio::test]
    async fn test_fresh_store_skips_source() {
        let stored = rows_for("AAPL", &days_from(days_ago(29), 29), 180.0);
        let store = Arc::new(MemoryStore::with_rows(stored));
        let source = Arc::new(FakeSource::new().with_bars("AAPL", bars_for(&days_from(days_ago(30), 30), 1.0)));

        let series = reconciler(&store, &source).reconcile_as_of("AAPL", 30, today()).await.unwrap();

        assert_eq!(source.fetch_calls(), 0);
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(series.source(), DataSource::Cache);
        assert_eq!(series.len(), 29);
        assert_eq!(series.inserted(), 0);
        assert_strictly_increasing(&series);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(FakeSource::new());

        let err = reconciler(&store, &source).reconcile_as_of("ZZZZ", 30, today()).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!err.is_upstream());
        assert_eq!(source.fetch_calls(), 1);
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_rows_without_source_data_is_not_found() {
        let store = Arc::new(MemoryStore::with_rows(rows_for("DELISTED", &days_from(days_ago(5), 3), 4.0)));
        let source = Arc::new(FakeSource::new());

        let err = reconciler(&store, &source).reconcile_as_of("DELISTED", 30, today()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remote_fetch_persists_and_is_idempotent() {
        let trading_days: Vec<NaiveDate> = days_from(days_ago(30), 30)
            .into_iter()
            .filter(|d| crate::services::trading_hours::is_weekday(*d))
            .collect();
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(FakeSource::new().with_bars("AAPL", bars_for(&trading_days, 100.0)));
        let engine = reconciler(&store, &source);

        let first = engine.reconcile_as_of("aapl", 30, today()).await.unwrap();
        assert_eq!(first.symbol(), "AAPL");
        assert_eq!(first.source(), DataSource::Remote);
        assert_eq!(first.inserted(), trading_days.len());
        assert_eq!(first.dates(), trading_days);
        assert_eq!(store.insert_calls(), 1);

        // Weekends keep the store below the fixed threshold, so the source is hit again
        let second = engine.reconcile_as_of("AAPL", 30, today()).await.unwrap();
        assert_eq!(source.fetch_calls(), 2);
        assert_eq!(second.inserted(), 0);
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(second.rows(), first.rows());
        assert_eq!(store.all_rows().len(), trading_days.len());
    }

    #[tokio::test]
    async fn test_trading_day_policy_treats_weekday_coverage_as_fresh() {
        let trading_days: Vec<NaiveDate> = days_from(days_ago(30), 30)
            .into_iter()
            .filter(|d| crate::services::trading_hours::is_weekday(*d))
            .collect();
        let store = Arc::new(MemoryStore::with_rows(rows_for("AAPL", &trading_days, 100.0)));
        let source = Arc::new(FakeSource::new());

        let series = reconciler(&store, &source)
            .with_policy(FreshnessPolicy::TradingDays { slack_days: 1 })
            .reconcile_as_of("AAPL", 30, today())
            .await
            .unwrap();

        assert_eq!(series.source(), DataSource::Cache);
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_merge_keeps_stored_rows_and_never_duplicates() {
        let stored = rows_for("MSFT", &days_from(days_ago(10), 5), 400.0);
        let store = Arc::new(MemoryStore::with_rows(stored.clone()));
        // Overlaps the stored days with different prices
        let source = Arc::new(FakeSource::new().with_bars("MSFT", bars_for(&days_from(days_ago(12), 12), 1.0)));

        let series = reconciler(&store, &source).reconcile_as_of("MSFT", 30, today()).await.unwrap();

        assert_strictly_increasing(&series);
        assert_eq!(series.len(), 12);
        assert_eq!(series.inserted(), 7);
        for row in &stored {
            let merged = series.rows().iter().find(|r| r.date == row.date).unwrap();
            assert_eq!(merged.avg_price, row.avg_price);
        }
    }

    #[tokio::test]
    async fn test_rows_older_than_window_are_not_reinserted() {
        let old_day = days_ago(40);
        let store = Arc::new(MemoryStore::with_rows(vec![PriceRow::new("TSLA", old_day, 250.0)]));
        let mut bars = vec![DailyBar::from_close(old_day, 251.0)];
        bars.extend(bars_for(&days_from(days_ago(3), 3), 260.0));
        let source = Arc::new(FakeSource::new().with_bars("TSLA", bars));

        let series = reconciler(&store, &source).reconcile_as_of("TSLA", 30, today()).await.unwrap();

        assert_eq!(series.inserted(), 3);
        let old_rows: Vec<_> = store.all_rows().into_iter().filter(|r| r.date == old_day).collect();
        assert_eq!(old_rows.len(), 1);
        assert_eq!(old_rows[0].avg_price, 250.0);
    }

    #[tokio::test]
    async fn test_non_finite_closes_are_skipped() {
        let dates = days_from(days_ago(4), 4);
        let bars = vec![
            DailyBar::from_close(dates[0], 10.0),
            DailyBar::from_close(dates[1], f64::NAN),
            DailyBar::from_close(dates[2], f64::INFINITY),
            DailyBar::from_close(dates[3], 11.0),
        ];
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(FakeSource::new().with_bars("NVDA", bars));

        let series = reconciler(&store, &source).reconcile_as_of("NVDA", 30, today()).await.unwrap();

        assert_eq!(series.closes(), vec![10.0, 11.0]);
        assert!(store.all_rows().iter().all(|r| r.avg_price.is_finite()));
    }

    #[tokio::test]
    async fn test_insert_failure_is_upstream() {
        let store = Arc::new(MemoryStore::default());
        store.fail_inserts.store(true, Ordering::SeqCst);
        let source = Arc::new(FakeSource::new().with_bars("AAPL", bars_for(&days_from(days_ago(5), 5), 100.0)));

        let err = reconciler(&store, &source).reconcile_as_of("AAPL", 30, today()).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_source_failure_is_upstream() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(FakeSource::new().failing_for("AAPL"));

        let err = reconciler(&store, &source).reconcile_as_of("AAPL", 30, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(
            FakeSource::new()
                .with_bars("AAPL", bars_for(&days_from(days_ago(5), 5), 100.0))
                .with_delay(Duration::from_millis(500)),
        );

        let err = reconciler(&store, &source)
            .with_fetch_timeout(Duration::from_millis(20))
            .reconcile_as_of("AAPL", 30, today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Timeout(_)));
        assert!(err.is_upstream());
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(FakeSource::new());
        let engine = reconciler(&store, &source);

        for (symbol, days) in [("  ", 30), ("AAPL", 0), ("AAPL", MAX_WINDOW_DAYS + 1)] {
            let err = engine.reconcile_as_of(symbol, days, today()).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{:?}", err);
        }
        assert_eq!(source.fetch_calls(), 0);
    }
}
