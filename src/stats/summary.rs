//! Summary statistics over valid amounts.

use crate::domain::{CanonicalRow, Notice, SummaryStats};

/// Mean, max, min, and population standard deviation of every non-NaN amount.
pub fn summarize(rows: &[CanonicalRow]) -> Result<SummaryStats, Notice> {
    let amounts: Vec<f64> = rows
        .iter()
        .filter(|r| r.has_amount())
        .map(|r| r.amount)
        .collect();
    summarize_values(&amounts)
}

/// Same as [`summarize`] on bare values; NaNs are skipped.
pub fn summarize_values(values: &[f64]) -> Result<SummaryStats, Notice> {
    let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return Err(Notice::NoValidData);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    // Population variance: divide by n, not n - 1.
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    Ok(SummaryStats {
        count: values.len(),
        mean,
        max,
        min,
        std_dev: variance.sqrt(),
    })
}

/// Round half away from zero to two decimals (display only).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
