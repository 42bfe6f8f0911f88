use crate::models::DataSource;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// API request performance metrics
#[derive(Debug, Clone)]
pub struct ApiPerformanceMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: ApiStatus,
    pub endpoint: String,
    pub symbol: Option<String>,
    pub window_days: Option<u32>,
    pub row_count: usize,
    pub rows_inserted: usize,
    pub data_source: Option<DataSource>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Success,
    Fail,
}

impl ApiPerformanceMetrics {
    pub fn new(endpoint: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: start_time,
            duration_ms: 0,
            status: ApiStatus::Success,
            endpoint: endpoint.into(),
            symbol: None,
            window_days: None,
            row_count: 0,
            rows_inserted: 0,
            data_source: None,
            error_message: None,
        }
    }

    pub fn fail(&mut self, error: impl ToString) {
        self.status = ApiStatus::Fail;
        self.error_message = Some(error.to_string());
    }

    pub fn complete(&mut self) {
        self.complete_at(Utc::now());
    }

    pub fn complete_at(&mut self, end_time: DateTime<Utc>) {
        self.end_time = end_time;
        self.duration_ms = (self.end_time - self.start_time).num_milliseconds().max(0) as u64;
    }

    /// Compact one-line summary
    pub fn format_line(&self) -> String {
        let status_str = match self.status {
            ApiStatus::Success => "OK",
            ApiStatus::Fail => "FAIL",
        };

        let duration_str = if self.duration_ms >= 1000 {
            format!("{}.{:01}s", self.duration_ms / 1000, (self.duration_ms % 1000) / 100)
        } else {
            format!("{}ms", self.duration_ms)
        };

        let mut line = format!("{} | {} | {}", self.endpoint, status_str, duration_str);
        if let Some(ref symbol) = self.symbol {
            line.push_str(&format!(" | symbol:{}", symbol));
        }
        if let Some(days) = self.window_days {
            line.push_str(&format!(" days:{}", days));
        }
        line.push_str(&format!(" rows:{}", self.row_count));
        if let Some(source) = self.data_source {
            line.push_str(&format!(" source:{} inserted:{}", source, self.rows_inserted));
        }
        if let Some(ref error) = self.error_message {
            line.push_str(&format!(" error:{}", error));
        }
        line
    }
}

/// Emit the metrics as one structured tracing event
pub fn write_api_log_entry(metrics: &ApiPerformanceMetrics) {
    match metrics.status {
        ApiStatus::Success => info!(
            endpoint = %metrics.endpoint,
            duration_ms = metrics.duration_ms,
            "{}",
            metrics.format_line()
        ),
        ApiStatus::Fail => warn!(
            endpoint = %metrics.endpoint,
            duration_ms = metrics.duration_ms,
            "{}",
            metrics.format_line()
        ),
    }
}
