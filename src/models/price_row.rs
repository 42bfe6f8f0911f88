use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One stored closing price: at most one row per `(symbol, date)`
///
/// Rows are created when a fetched day is missing from the store and are
/// never updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Ticker symbol (upper-case)
    pub symbol: String,

    /// Trading date, day resolution
    pub date: NaiveDate,

    /// Closing price for that day
    pub avg_price: f64,
}

impl PriceRow {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, avg_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            avg_price,
        }
    }
}
