//! Runtime configuration
//!
//! Every setting has a default and can be overridden with an environment
//! variable:
//!
//! | Env Var                 | Field                   | Default                 |
//! |-------------------------|-------------------------|-------------------------|
//! | `DATABASE_PATH`         | `database_path`         | `data/stockinsight.db`  |
//! | `PORT`                  | `port`                  | `8000`                  |
//! | `YAHOO_BASE_URL`        | `yahoo_base_url`        | Yahoo Finance query1    |
//! | `FETCH_TIMEOUT_SECS`    | `fetch_timeout`         | `20`                    |
//! | `DEFAULT_WINDOW_DAYS`   | `default_window_days`   | `30`                    |
//! | `FRESHNESS_SLACK_DAYS`  | `freshness` slack       | `2`                     |
//! | `FRESHNESS_MODE`        | `freshness` kind        | `fixed`                 |
//! | `RATE_LIMIT_PER_MINUTE` | `rate_limit_per_minute` | `60`                    |
//! | `CORS_ORIGINS`          | `cors_origins`          | `*`                     |

use crate::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FRESHNESS_SLACK_DAYS, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, YAHOO_BASE_URL,
};
use crate::error::{AppError, Result};
use crate::services::freshness::FreshnessPolicy;
use crate::utils::env_var;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Allowed CORS origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub yahoo_base_url: String,
    pub fetch_timeout: Duration,
    pub default_window_days: u32,
    pub freshness: FreshnessPolicy,
    pub rate_limit_per_minute: u32,
    pub cors_origins: CorsOrigins,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            port: DEFAULT_PORT,
            yahoo_base_url: YAHOO_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            default_window_days: DEFAULT_WINDOW_DAYS,
            freshness: FreshnessPolicy::default(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            cors_origins: CorsOrigins::Any,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_var)
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let yahoo_base_url = lookup("YAHOO_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.yahoo_base_url);
        if !yahoo_base_url.starts_with("http://") && !yahoo_base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "YAHOO_BASE_URL must start with http:// or https://, got: '{}'",
                yahoo_base_url
            )));
        }

        let fetch_timeout_secs: u64 = parse_or(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        if fetch_timeout_secs == 0 {
            return Err(AppError::Config("FETCH_TIMEOUT_SECS must be positive".to_string()));
        }

        let default_window_days: u32 = parse_or(&lookup, "DEFAULT_WINDOW_DAYS", defaults.default_window_days)?;
        if default_window_days == 0 || default_window_days > MAX_WINDOW_DAYS {
            return Err(AppError::Config(format!(
                "DEFAULT_WINDOW_DAYS must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, default_window_days
            )));
        }

        let slack_days: u32 = parse_or(&lookup, "FRESHNESS_SLACK_DAYS", DEFAULT_FRESHNESS_SLACK_DAYS)?;
        let freshness = match lookup("FRESHNESS_MODE").as_deref() {
            None => FreshnessPolicy::FixedSlack { slack_days },
            Some(mode) => FreshnessPolicy::parse(mode, slack_days).map_err(AppError::Config)?,
        };

        let rate_limit_per_minute: u32 = parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?;
        if rate_limit_per_minute == 0 {
            return Err(AppError::Config("RATE_LIMIT_PER_MINUTE must be positive".to_string()));
        }

        let cors_origins = match lookup("CORS_ORIGINS") {
            None => CorsOrigins::Any,
            Some(value) if value == "*" => CorsOrigins::Any,
            Some(value) => CorsOrigins::List(
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            ),
        };

        Ok(Self {
            database_path,
            port,
            yahoo_base_url,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            default_window_days,
            freshness,
            rate_limit_per_minute,
            cors_origins,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{}='{}': {}", key, raw, e))),
    }
}
