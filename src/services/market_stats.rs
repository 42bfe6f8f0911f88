/// Summary statistics over a closing-price series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub high: f64,
    pub low: f64,
    pub mean: f64,
    pub latest: f64,

    /// `latest - mean`
    pub deviation: f64,

    /// Deviation as a percentage of the mean, 0 when the mean is 0
    pub deviation_percent: f64,
}

impl PriceSummary {
    /// `None` for an empty series
    pub fn compute(closes: &[f64]) -> Option<Self> {
        let latest = *closes.last()?;

        let high = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = closes.iter().sum::<f64>() / closes.len() as f64;
        let deviation = latest - mean;
        let deviation_percent = if mean == 0.0 { 0.0 } else { deviation / mean * 100.0 };

        Some(Self {
            high,
            low,
            mean,
            latest,
            deviation,
            deviation_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let summary = PriceSummary::compute(&[10.0, 12.0, 8.0, 14.0]).unwrap();
        assert_eq!(summary.high, 14.0);
        assert_eq!(summary.low, 8.0);
        assert_eq!(summary.mean, 11.0);
        assert_eq!(summary.latest, 14.0);
        assert_eq!(summary.deviation, 3.0);
        assert!((summary.deviation_percent - 27.272727).abs() < 1e-5);
    }

    #[test]
    fn test_single_value() {
        let summary = PriceSummary::compute(&[42.5]).unwrap();
        assert_eq!(summary.high, 42.5);
        assert_eq!(summary.low, 42.5);
        assert_eq!(summary.deviation, 0.0);
        assert_eq!(summary.deviation_percent, 0.0);
    }

    #[test]
    fn test_zero_mean() {
        let summary = PriceSummary::compute(&[0.0, 0.0]).unwrap();
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.deviation_percent, 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(PriceSummary::compute(&[]).is_none());
    }
}
