//! Date-Keyed Deduplication Utilities
//!
//! The price store keeps one row per `(symbol, date)`. These helpers enforce
//! the same rule on in-memory batches before they are merged or written.

use crate::models::PriceRow;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Deduplicates price rows by `(symbol, date)`
pub struct DateDeduplicator {
    seen_keys: HashSet<(String, NaiveDate)>,
}

impl Default for DateDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl DateDeduplicator {
    /// Create a new deduplicator
    pub fn new() -> Self {
        Self {
            seen_keys: HashSet::new(),
        }
    }

    /// Create a deduplicator that already treats the given dates as seen
    pub fn with_existing<I>(symbol: &str, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            seen_keys: dates.into_iter().map(|d| (symbol.to_string(), d)).collect(),
        }
    }

    /// Deduplication key for a row
    pub fn get_key(record: &PriceRow) -> (String, NaiveDate) {
        (record.symbol.clone(), record.date)
    }

    /// Check if record is duplicate, remembering it if not
    pub fn is_duplicate(&mut self, record: &PriceRow) -> bool {
        !self.seen_keys.insert(Self::get_key(record))
    }

    /// Filter duplicates from a slice
    ///
    /// Use `keep_last=true` to keep the last occurrence of duplicates, `false` to keep first.
    /// The relative order of surviving records is preserved.
    pub fn filter_duplicates(records: &[PriceRow], keep_last: bool) -> Vec<&PriceRow> {
        let mut seen_keys = HashSet::new();
        let mut filtered = Vec::new();

        // Process in reverse if we want to keep last occurrence
        let iter: Box<dyn Iterator<Item = &PriceRow>> = if keep_last {
            Box::new(records.iter().rev())
        } else {
            Box::new(records.iter())
        };

        for record in iter {
            if seen_keys.insert(Self::get_key(record)) {
                filtered.push(record);
            }
        }

        if keep_last {
            filtered.reverse();
        }

        filtered
    }

    /// Filter duplicates and return owned records
    pub fn filter_duplicates_owned(records: &[PriceRow], keep_last: bool) -> Vec<PriceRow> {
        Self::filter_duplicates(records, keep_last)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Count duplicates in dataset
    pub fn count_duplicates(records: &[PriceRow]) -> usize {
        let mut seen_keys = HashSet::new();
        records
            .iter()
            .filter(|record| !seen_keys.insert(Self::get_key(record)))
            .count()
    }

    /// Dates that occur more than once, with their counts
    pub fn get_duplicate_info(records: &[PriceRow]) -> Vec<(NaiveDate, usize)> {
        let mut key_counts: HashMap<NaiveDate, usize> = HashMap::new();
        for record in records {
            *key_counts.entry(record.date).or_insert(0) += 1;
        }

        let mut info: Vec<_> = key_counts.into_iter().filter(|(_, count)| *count > 1).collect();
        info.sort();
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(d: u32, price: f64) -> PriceRow {
        PriceRow::new("MSFT", NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), price)
    }

    #[test]
    fn test_filter_keep_first_and_last() {
        let rows = vec![row(1, 1.0), row(2, 2.0), row(1, 10.0), row(3, 3.0)];

        let first = DateDeduplicator::filter_duplicates_owned(&rows, false);
        assert_eq!(first.iter().map(|r| r.avg_price).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);

        let last = DateDeduplicator::filter_duplicates_owned(&rows, true);
        assert_eq!(last.iter().map(|r| r.avg_price).collect::<Vec<_>>(), vec![2.0, 10.0, 3.0]);
    }

    #[test]
    fn test_is_duplicate_with_existing_dates() {
        let existing = [NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        let mut dedup = DateDeduplicator::with_existing("MSFT", existing);

        assert!(dedup.is_duplicate(&row(1, 1.0)));
        assert!(!dedup.is_duplicate(&row(2, 2.0)));
        assert!(dedup.is_duplicate(&row(2, 2.5)));
    }

    #[test]
    fn test_count_and_info() {
        let rows = vec![row(1, 1.0), row(1, 1.1), row(1, 1.2), row(2, 2.0)];
        assert_eq!(DateDeduplicator::count_duplicates(&rows), 2);
        assert_eq!(
            DateDeduplicator::get_duplicate_info(&rows),
            vec![(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3)]
        );
    }

    #[test]
    fn test_other_symbols_do_not_collide() {
        let mut dedup = DateDeduplicator::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(!dedup.is_duplicate(&PriceRow::new("AAPL", date, 1.0)));
        assert!(!dedup.is_duplicate(&PriceRow::new("MSFT", date, 1.0)));
    }
}
