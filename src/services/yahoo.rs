//! Yahoo Finance chart API client
//!
//! Features:
//! - Shared sliding-window rate limiter (requests per minute, across tasks)
//! - Exponential backoff retry logic (max 5 attempts) on 429, 5xx and transport errors
//! - Exchange-local trading dates derived from `meta.gmtoffset`
//! - Unknown symbols map to an empty result instead of an error

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::DailyBar;
use crate::services::market_data::{MarketDataSource, QuoteSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Maximum attempts per request
const MAX_RETRIES: u32 = 5;

/// Range used for quote lookups
const QUOTE_RANGE_DAYS: u32 = 5;

/// Sliding window shared by every task that talks to the provider
#[derive(Debug)]
pub struct SharedRateLimiter {
    request_timestamps: TokioMutex<Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl SharedRateLimiter {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self::with_window(rate_limit_per_minute, Duration::from_secs(60))
    }

    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            request_timestamps: TokioMutex::new(Vec::new()),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Wait until a request slot is free, then claim it
    pub async fn acquire(&self) {
        loop {
            let now = Instant::now();
            let mut timestamps = self.request_timestamps.lock().await;
            timestamps.retain(|&stamp| now.duration_since(stamp) < self.window);

            if timestamps.len() < self.max_requests as usize {
                timestamps.push(now);
                return;
            }

            let oldest = timestamps[0];
            let wait_time = self.window.saturating_sub(now.duration_since(oldest));
            // Release the lock while sleeping so other tasks can prune
            drop(timestamps);
            debug!("Rate limit reached, waiting {:?}", wait_time);
            sleep(wait_time + Duration::from_millis(10)).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    /// Seconds east of UTC for the listing exchange
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResult {
    /// Daily bars with a finite close, in provider order
    fn daily_bars(&self) -> Vec<DailyBar> {
        let empty = ChartQuote::default();
        let quote = self.indicators.quote.first().unwrap_or(&empty);
        let value = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &timestamp)| {
                let close = value(&quote.close, i)?;
                let date = local_date(timestamp, self.meta.gmtoffset)?;
                let bar = DailyBar::new(
                    date,
                    value(&quote.open, i).unwrap_or(close),
                    value(&quote.high, i).unwrap_or(close),
                    value(&quote.low, i).unwrap_or(close),
                    close,
                );
                bar.is_finite().then_some(bar)
            })
            .collect()
    }

    fn latest_price(&self) -> Option<f64> {
        self.meta
            .regular_market_price
            .filter(|price| price.is_finite())
            .or_else(|| self.daily_bars().last().map(|bar| bar.close))
    }
}

fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Parse a chart response body. `None` means the symbol is unknown.
fn parse_chart(body: &str) -> Result<Option<ChartResult>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(None);
        }
        return Err(AppError::Parse(format!(
            "chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    Ok(envelope.chart.result.and_then(|results| results.into_iter().next()))
}

/// Yahoo Finance client with rate limiting and retry logic
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<SharedRateLimiter>,
    backoff_base: Duration,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout: Duration, rate_limit_per_minute: u32) -> Result<Self> {
        Self::with_rate_limiter(
            base_url,
            timeout,
            Arc::new(SharedRateLimiter::new(rate_limit_per_minute)),
        )
    }

    pub fn with_rate_limiter(base_url: &str, timeout: Duration, rate_limiter: Arc<SharedRateLimiter>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockinsight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            backoff_base: Duration::from_secs(1),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.yahoo_base_url, config.fetch_timeout, config.rate_limit_per_minute)
    }

    /// Override the retry backoff unit (first retry waits roughly this long)
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    fn chart_url(&self, symbol: &str, range_days: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v8/finance/chart/", self.base_url))
            .map_err(|e| AppError::Config(format!("invalid Yahoo base URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Yahoo base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("range", &format!("{}d", range_days))
            .append_pair("interval", "1d");
        Ok(url)
    }

    /// Fetch a chart with retry logic and exponential backoff
    async fn chart(&self, symbol: &str, range_days: u32) -> Result<Option<ChartResult>> {
        let url = self.chart_url(symbol, range_days)?;
        let mut last_error = AppError::Network("no request attempted".to_string());

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let factor = 2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>();
                let delay = self.backoff_base.mul_f64(factor).min(Duration::from_secs(30));
                info!(
                    "Yahoo retry backoff for {}: attempt {}/{}, waiting {:.1}s",
                    symbol,
                    attempt + 1,
                    MAX_RETRIES,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }

            self.rate_limiter.acquire().await;

            let response = match self.client.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Yahoo request for {} failed (attempt {}): {}", symbol, attempt + 1, e);
                    last_error = e.into();
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() || status == StatusCode::NOT_FOUND {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!("Failed to read Yahoo response body (attempt {}): {}", attempt + 1, e);
                        last_error = e.into();
                        continue;
                    }
                };
                if status == StatusCode::NOT_FOUND {
                    debug!("Yahoo has no chart for {}", symbol);
                    return Ok(parse_chart(&body).ok().flatten());
                }
                return parse_chart(&body);
            } else if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Yahoo rate limited ({}), retrying...", status);
                last_error = AppError::RateLimit;
            } else if status.is_server_error() {
                warn!("Yahoo server error ({}), retrying...", status);
                last_error = AppError::Network(format!("HTTP {} from Yahoo for {}", status, symbol));
            } else {
                // Other client errors are not retried
                return Err(AppError::Network(format!("HTTP {} from Yahoo for {}", status, symbol)));
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch(&self, symbol: &str, window_days: u32) -> Result<Vec<DailyBar>> {
        let bars = match self.chart(symbol, window_days).await? {
            Some(chart) => chart.daily_bars(),
            None => Vec::new(),
        };
        debug!("Fetched {} daily bars for {} ({}d)", bars.len(), symbol, window_days);
        Ok(bars)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        Ok(self
            .chart(symbol, QUOTE_RANGE_DAYS)
            .await?
            .and_then(|chart| chart.latest_price()))
    }
}
