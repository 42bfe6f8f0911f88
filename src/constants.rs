//! Engine constants
//!
//! Defaults for the reconciliation window, the freshness tolerance and the
//! indicator periods. Runtime overrides live in [`crate::config::AppConfig`].

/// Trailing window (calendar days) reconciled when the caller gives none
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Largest window accepted from a caller
pub const MAX_WINDOW_DAYS: u32 = 730;

/// Missing calendar days tolerated before the stored rows count as stale
///
/// 30-day window with slack 2 means 28 stored rows are enough to skip the
/// remote fetch (weekends and holidays).
pub const DEFAULT_FRESHNESS_SLACK_DAYS: u32 = 2;

/// Wilder RSI lookback
pub const RSI_PERIOD: usize = 14;

/// MACD fast EMA span
pub const MACD_FAST_SPAN: usize = 12;

/// MACD slow EMA span
pub const MACD_SLOW_SPAN: usize = 26;

/// MACD signal EMA span
pub const MACD_SIGNAL_SPAN: usize = 9;

/// Upper bound on one remote fetch, including retries
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

/// Requests per minute allowed against the market data provider
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default SQLite database location
pub const DEFAULT_DATABASE_PATH: &str = "data/stockinsight.db";

/// Yahoo Finance API host
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
