//! Decides whether the stored window is complete enough to skip a remote fetch

use crate::constants::DEFAULT_FRESHNESS_SLACK_DAYS;
use crate::services::trading_hours::count_weekdays;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Require `window_days - slack_days` stored rows
    FixedSlack { slack_days: u32 },

    /// Require one row per weekday in the window, minus `slack_days`
    TradingDays { slack_days: u32 },
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy::FixedSlack {
            slack_days: DEFAULT_FRESHNESS_SLACK_DAYS,
        }
    }
}

impl FreshnessPolicy {
    pub fn parse(mode: &str, slack_days: u32) -> Result<Self, String> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(FreshnessPolicy::FixedSlack { slack_days }),
            "trading-days" | "trading_days" => Ok(FreshnessPolicy::TradingDays { slack_days }),
            other => Err(format!(
                "unknown freshness mode '{}', expected 'fixed' or 'trading-days'",
                other
            )),
        }
    }

    /// Minimum stored rows in `[today - window_days, today]` for a cache hit
    pub fn min_rows(&self, window_days: u32, today: NaiveDate) -> usize {
        match *self {
            FreshnessPolicy::FixedSlack { slack_days } => window_days.saturating_sub(slack_days) as usize,
            FreshnessPolicy::TradingDays { slack_days } => {
                let start = today - Duration::days(window_days as i64);
                count_weekdays(start, today).saturating_sub(slack_days as usize)
            }
        }
    }

    /// Whether `stored_rows` rows satisfy the policy. An empty store is never fresh.
    pub fn is_fresh(&self, stored_rows: usize, window_days: u32, today: NaiveDate) -> bool {
        stored_rows > 0 && stored_rows >= self.min_rows(window_days, today)
    }
}
