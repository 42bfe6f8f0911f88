use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Regular session of the US equity market
pub struct TradingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub timezone: Tz,
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            timezone: chrono_tz::America::New_York,
        }
    }
}

impl TradingHours {
    /// Whether `at` falls inside the regular session
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if !is_weekday(local.date_naive()) {
            return false;
        }
        let time = local.time();
        time >= self.open && time < self.close
    }
}

/// Check if current time is within trading hours
pub fn is_trading_hours() -> bool {
    TradingHours::default().contains(Utc::now())
}

/// Get appropriate cache control max-age based on trading hours
///
/// During trading hours: 30 seconds (today's close is still moving)
/// Outside trading hours: 300 seconds
pub fn get_cache_max_age() -> u32 {
    if is_trading_hours() {
        30
    } else {
        300
    }
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of Monday-Friday days in `[start, end)`. Exchange holidays are not excluded.
pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> usize {
    start
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| is_weekday(*day))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trading_hours_config() {
        let config = TradingHours::default();
        assert_eq!(config.open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.close, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(config.timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn test_session_boundaries() {
        let hours = TradingHours::default();
        // 2024-06-05 is a Wednesday; New York is UTC-4 in June
        let open = Utc.with_ymd_and_hms(2024, 6, 5, 13, 30, 0).unwrap();
        let before_open = Utc.with_ymd_and_hms(2024, 6, 5, 13, 29, 0).unwrap();
        let close = Utc.with_ymd_and_hms(2024, 6, 5, 20, 0, 0).unwrap();
        assert!(hours.contains(open));
        assert!(!hours.contains(before_open));
        assert!(!hours.contains(close));

        let saturday_noon = Utc.with_ymd_and_hms(2024, 6, 8, 16, 0, 0).unwrap();
        assert!(!hours.contains(saturday_noon));
    }

    #[test]
    fn test_count_weekdays() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(count_weekdays(monday, monday), 0);
        assert_eq!(count_weekdays(monday, monday + chrono::Duration::days(7)), 5);
        assert_eq!(count_weekdays(monday, monday + chrono::Duration::days(30)), 22);

        let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        assert_eq!(count_weekdays(saturday, saturday + chrono::Duration::days(2)), 0);
    }

    #[test]
    fn test_cache_max_age_values() {
        assert!(matches!(get_cache_max_age(), 30 | 300));
    }
}
