use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Price analysis for one symbol, as returned by `GET /stock-price/{symbol}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub highest_price: f64,
    pub lowest_price: f64,
    pub avg_price: f64,
    pub latest_price: f64,
    pub price_deviation: f64,
    pub price_deviation_percent: f64,

    /// RSI at the latest date, `null` when not computable
    pub rsi: Option<f64>,

    /// Daily closes with the RSI aligned by position
    pub data: Vec<PricePoint>,

    /// MACD line, signal and histogram aligned by position
    pub macd_data: Vec<MacdPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub avg_price: f64,
    pub rsi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub date: NaiveDate,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}
