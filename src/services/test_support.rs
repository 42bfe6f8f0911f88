//! In-memory stand-ins for the store and the market data provider

use crate::error::{AppError, Result};
use crate::models::{DailyBar, PriceRow};
use crate::services::market_data::{MarketDataSource, QuoteSource};
use crate::services::price_store::{PriceStore, WishlistStore};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Consecutive calendar days `[first, first + count)`
pub fn days_from(first: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count as i64).map(|i| first + ChronoDuration::days(i)).collect()
}

pub fn rows_for(symbol: &str, dates: &[NaiveDate], first_price: f64) -> Vec<PriceRow> {
    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| PriceRow::new(symbol, date, first_price + i as f64))
        .collect()
}

pub fn bars_for(dates: &[NaiveDate], first_price: f64) -> Vec<DailyBar> {
    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| DailyBar::from_close(date, first_price + i as f64))
        .collect()
}

/// Price store and wishlist store backed by vectors
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<PriceRow>>,
    wishlists: Mutex<Vec<(String, String)>>,
    pub insert_calls: AtomicUsize,
    pub fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<PriceRow>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn all_rows(&self) -> Vec<PriceRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn query(&self, symbol: &str, since: Option<NaiveDate>) -> Result<Vec<PriceRow>> {
        let rows = self.rows.lock().unwrap();
        // Reverse so callers cannot depend on insertion order
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.symbol == symbol && since.map_or(true, |s| r.date >= s))
            .cloned()
            .collect())
    }

    async fn insert(&self, new_rows: &[PriceRow]) -> Result<usize> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("database is locked".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut keys: HashSet<(String, NaiveDate)> = rows.iter().map(|r| (r.symbol.clone(), r.date)).collect();
        let mut inserted = 0;
        for row in new_rows {
            if keys.insert((row.symbol.clone(), row.date)) {
                rows.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn symbols_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .wishlists
            .lock()
            .unwrap()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, symbol)| symbol.clone())
            .collect())
    }

    async fn add_symbol(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let mut wishlists = self.wishlists.lock().unwrap();
        let entry = (user_id.to_string(), symbol.to_string());
        if wishlists.contains(&entry) {
            return Ok(false);
        }
        wishlists.push(entry);
        Ok(true)
    }

    async fn remove_symbol(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let mut wishlists = self.wishlists.lock().unwrap();
        let before = wishlists.len();
        wishlists.retain(|(user, s)| !(user == user_id && s == symbol));
        Ok(wishlists.len() != before)
    }
}

/// Market data source serving canned bars and quotes, counting calls
#[derive(Default)]
pub struct FakeSource {
    bars: HashMap<String, Vec<DailyBar>>,
    quotes: HashMap<String, f64>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    pub fetch_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, symbol: &str, price: f64) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    /// Every call for `symbol` fails with a network error
    pub fn failing_for(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn before_call(&self, symbol: &str) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(symbol) {
            return Err(AppError::Network(format!("connection reset fetching {}", symbol)));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch(&self, symbol: &str, _window_days: u32) -> Result<Vec<DailyBar>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call(symbol).await?;
        Ok(self.bars.get(symbol).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl QuoteSource for FakeSource {
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        self.before_call(symbol).await?;
        Ok(self.quotes.get(symbol).copied())
    }
}
