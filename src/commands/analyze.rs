use crate::config::AppConfig;
use crate::error::Result;
use crate::server::AppState;
use crate::services::{SqliteStore, YahooClient};
use std::sync::Arc;

/// Reconcile one symbol against the configured store and print the analysis as JSON
pub async fn run(config: AppConfig, symbol: String, days: Option<u32>) -> Result<()> {
    let window_days = days.unwrap_or(config.default_window_days);

    let store = Arc::new(SqliteStore::new(config.database_path.clone()).await?);
    let yahoo = Arc::new(YahooClient::from_config(&config)?);
    let state = AppState::new(store.clone(), yahoo, &config);

    let result = state.analyzer.analyze(&symbol, window_days).await;
    store.close().await;
    let (analysis, series) = result?;

    eprintln!(
        "📈 {}: {} rows over {} days (source: {}, new rows: {})",
        series.symbol(),
        series.len(),
        window_days,
        series.source(),
        series.inserted()
    );
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
