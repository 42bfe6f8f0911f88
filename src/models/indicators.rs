//! Technical indicators computed from a date-ordered closing-price series
//!
//! # Conventions
//! - Input is oldest first, one value per trading day.
//! - Every output vector is aligned 1:1 with the input (or empty when the
//!   indicator cannot be computed at all).
//! - No NaN or infinite value ever leaves this module: RSI positions that
//!   cannot be computed are `None`, EMA/MACD are defined from the first sample.
//!
//! ## Smoothing
//! Both indicators use the recursive (non-adjusted) exponential average
//! `s[0] = x[0]`, `s[i] = s[i-1] + α * (x[i] - s[i-1])`.
//! - EMA with span `n`: `α = 2 / (n + 1)`
//! - Wilder smoothing with period `n`: `α = 1 / n`

use crate::constants::{MACD_FAST_SPAN, MACD_SIGNAL_SPAN, MACD_SLOW_SPAN};
use serde::{Deserialize, Serialize};

/// One MACD sample: line, signal line and histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    /// Fast EMA minus slow EMA
    pub macd: f64,
    /// EMA of the MACD line
    pub signal: f64,
    /// `macd - signal`
    pub histogram: f64,
}

/// Recursive exponential average seeded with the first value
fn exponential_smoothing(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;

    for &value in values {
        let next = match state {
            None => value,
            Some(prev) => prev + alpha * (value - prev),
        };
        state = Some(next);
        smoothed.push(next);
    }

    smoothed
}

/// Calculate an Exponential Moving Average for a given span
///
/// # Arguments
/// * `values` - Series in chronological order
/// * `span` - EMA span (e.g., 12, 26, 9); smoothing factor is `2 / (span + 1)`
///
/// # Returns
/// * Vector of EMA values, same length as input (empty when `span == 0`)
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    exponential_smoothing(values, 2.0 / (span as f64 + 1.0))
}

/// Calculate Wilder's Relative Strength Index
///
/// The price change of the first sample is taken as zero so that gains and
/// losses line up with `closes`. Average gain and loss are smoothed with
/// `α = 1 / period` and reported once `period` samples have been seen.
///
/// # Arguments
/// * `closes` - Closing prices in chronological order
/// * `period` - Lookback (14 by convention)
///
/// # Returns
/// * Same length as `closes`; `None` for indices below `period - 1` and
///   wherever the ratio is not finite (zero average loss, flat series)
/// * Empty when `closes` has fewer than `period` points or `period == 0`
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for window in closes.windows(2) {
        let delta = window[1] - window[0];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = exponential_smoothing(&gains, alpha);
    let avg_loss = exponential_smoothing(&losses, alpha);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .enumerate()
        .map(|(i, (&gain, &loss))| {
            if i + 1 < period {
                None
            } else {
                rsi_from_averages(gain, loss)
            }
        })
        .collect()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rs = avg_gain / avg_loss;
    if !rs.is_finite() {
        return None;
    }
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    rsi.is_finite().then_some(rsi)
}

/// Calculate MACD with the standard 12/26/9 spans
pub fn calculate_macd(closes: &[f64]) -> Vec<MacdValue> {
    calculate_macd_with(closes, MACD_FAST_SPAN, MACD_SLOW_SPAN, MACD_SIGNAL_SPAN)
}

/// Calculate MACD with custom spans
///
/// # Returns
/// * One [`MacdValue`] per input position (empty when any span is zero)
pub fn calculate_macd_with(closes: &[f64], fast_span: usize, slow_span: usize, signal_span: usize) -> Vec<MacdValue> {
    if fast_span == 0 || slow_span == 0 || signal_span == 0 {
        return Vec::new();
    }

    let fast = calculate_ema(closes, fast_span);
    let slow = calculate_ema(closes, slow_span);
    let macd_line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal_line = calculate_ema(&macd_line, signal_span);

    macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(&macd, &signal)| MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        })
        .collect()
}
