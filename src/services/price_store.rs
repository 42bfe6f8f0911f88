//! Storage seams consumed by the engine and the wishlist service

use crate::error::Result;
use crate::models::PriceRow;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Durable `(symbol, date) -> avg_price` table
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// All rows for `symbol`, optionally restricted to `date >= since`.
    /// No ordering guarantee.
    async fn query(&self, symbol: &str, since: Option<NaiveDate>) -> Result<Vec<PriceRow>>;

    /// Write a batch of rows in one transaction, returning how many were new.
    /// Rows whose `(symbol, date)` already exists are ignored.
    async fn insert(&self, rows: &[PriceRow]) -> Result<usize>;
}

/// Per-user list of tracked symbols
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Symbols saved by `user_id`, in the order they were added
    async fn symbols_for_user(&self, user_id: &str) -> Result<Vec<String>>;

    /// Returns false when the symbol was already on the list
    async fn add_symbol(&self, user_id: &str, symbol: &str) -> Result<bool>;

    /// Returns false when the symbol was not on the list
    async fn remove_symbol(&self, user_id: &str, symbol: &str) -> Result<bool>;
}
