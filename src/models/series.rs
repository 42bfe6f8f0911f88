use crate::models::PriceRow;
use crate::utils::deduplication::DateDeduplicator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Where a reconciled series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Stored rows were fresh enough, no remote call
    Cache,
    /// Stored rows were stale, the window was fetched and merged
    Remote,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Cache => "cache",
            DataSource::Remote => "remote",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date-sorted, duplicate-free closing prices for one symbol
///
/// Built per request and dropped after the response is assembled. The only
/// constructor enforces the ordering invariants, so every holder can rely on
/// strictly increasing dates and finite prices.
#[derive(Debug, Clone)]
pub struct ReconciledSeries {
    symbol: String,
    rows: Vec<PriceRow>,
    source: DataSource,
    inserted: usize,
}

impl ReconciledSeries {
    /// Sort by date and drop duplicate dates, keeping the earliest occurrence
    /// in `rows` (callers put stored rows before fetched ones).
    pub fn from_rows(symbol: impl Into<String>, rows: Vec<PriceRow>, source: DataSource) -> Self {
        let symbol = symbol.into();

        let before = rows.len();
        let mut rows: Vec<PriceRow> = rows.into_iter().filter(|r| r.avg_price.is_finite()).collect();
        if rows.len() != before {
            warn!(symbol = %symbol, dropped = before - rows.len(), "Dropped rows with non-finite prices");
        }

        // Stable sort keeps insertion order between equal dates
        rows.sort_by_key(|r| r.date);

        let duplicates = DateDeduplicator::count_duplicates(&rows);
        if duplicates > 0 {
            warn!(
                symbol = %symbol,
                duplicates,
                dates = ?DateDeduplicator::get_duplicate_info(&rows),
                "Duplicate dates in series, keeping first occurrence"
            );
            rows = DateDeduplicator::filter_duplicates_owned(&rows, false);
        }

        Self {
            symbol,
            rows,
            source,
            inserted: 0,
        }
    }

    /// Record how many rows this request persisted
    pub fn with_inserted(mut self, inserted: usize) -> Self {
        self.inserted = inserted;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Closing-price projection in date order
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.avg_price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn latest(&self) -> Option<&PriceRow> {
        self.rows.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_sorts_and_dedupes_keeping_first() {
        let rows = vec![
            PriceRow::new("AAPL", day(3), 103.0),
            PriceRow::new("AAPL", day(1), 101.0),
            PriceRow::new("AAPL", day(2), 102.0),
            PriceRow::new("AAPL", day(3), 999.0),
        ];

        let series = ReconciledSeries::from_rows("AAPL", rows, DataSource::Remote);

        assert_eq!(series.dates(), vec![day(1), day(2), day(3)]);
        assert_eq!(series.closes(), vec![101.0, 102.0, 103.0]);
        assert_eq!(series.latest().unwrap().avg_price, 103.0);
    }

    #[test]
    fn test_drops_non_finite_prices() {
        let rows = vec![
            PriceRow::new("AAPL", day(1), 101.0),
            PriceRow::new("AAPL", day(2), f64::NAN),
            PriceRow::new("AAPL", day(3), f64::INFINITY),
        ];

        let series = ReconciledSeries::from_rows("AAPL", rows, DataSource::Cache);
        assert_eq!(series.len(), 1);
        assert_eq!(series.source(), DataSource::Cache);
    }

    #[test]
    fn test_empty_series() {
        let series = ReconciledSeries::from_rows("ZZZZ", Vec::new(), DataSource::Remote);
        assert!(series.is_empty());
        assert!(series.latest().is_none());
        assert_eq!(series.inserted(), 0);
    }
}
