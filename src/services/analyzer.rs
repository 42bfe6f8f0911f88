use crate::constants::RSI_PERIOD;
use crate::error::{AppError, Result};
use crate::models::indicators::{calculate_macd, calculate_rsi};
use crate::models::{MacdPoint, PricePoint, ReconciledSeries, StockAnalysis};
use crate::services::market_stats::PriceSummary;
use crate::services::reconciler::PriceReconciler;

/// Reconciles a symbol and assembles the analysis response
#[derive(Clone)]
pub struct StockAnalyzer {
    reconciler: PriceReconciler,
}

impl StockAnalyzer {
    pub fn new(reconciler: PriceReconciler) -> Self {
        Self { reconciler }
    }

    /// Reconcile `symbol` over `window_days` and derive statistics and indicators
    pub async fn analyze(&self, symbol: &str, window_days: u32) -> Result<(StockAnalysis, ReconciledSeries)> {
        let series = self.reconciler.reconcile(symbol, window_days).await?;
        let analysis = build_analysis(&series)?;
        Ok((analysis, series))
    }
}

/// Zip the series with its RSI and MACD values
pub fn build_analysis(series: &ReconciledSeries) -> Result<StockAnalysis> {
    let closes = series.closes();
    let summary = PriceSummary::compute(&closes)
        .ok_or_else(|| AppError::NotFound(format!("no price data for symbol {}", series.symbol())))?;

    // Empty when the series is shorter than the period
    let rsi = calculate_rsi(&closes, RSI_PERIOD);
    let macd = calculate_macd(&closes);

    let data = series
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| PricePoint {
            date: row.date,
            avg_price: row.avg_price,
            rsi: rsi.get(i).copied().flatten(),
        })
        .collect();

    let macd_data = series
        .rows()
        .iter()
        .zip(macd.iter())
        .map(|(row, value)| MacdPoint {
            date: row.date,
            macd: value.macd,
            signal: value.signal,
            histogram: value.histogram,
        })
        .collect();

    Ok(StockAnalysis {
        highest_price: summary.high,
        lowest_price: summary.low,
        avg_price: summary.mean,
        latest_price: summary.latest,
        price_deviation: summary.deviation,
        price_deviation_percent: summary.deviation_percent,
        rsi: rsi.last().copied().flatten(),
        data,
        macd_data,
    })
}
