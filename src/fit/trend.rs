//! Sales trend over the daily series.
//!
//! `x` is each day's UTC-midnight timestamp in milliseconds and `y` is the
//! day's total. The fitted line is evaluated back at every observed day, and
//! optionally extended `forecast_days` past the last one.

use chrono::{Days, NaiveDate};

use crate::domain::{DailyPoint, FittedPoint, Notice, RegressionResult, TrendMethod};
use crate::fit::linear::{LineFit, fit_line};

pub fn fit_trend(
    daily: &[DailyPoint],
    method: TrendMethod,
    forecast_days: u32,
) -> Result<RegressionResult, Notice> {
    let points: Vec<(f64, f64)> = daily
        .iter()
        .map(|p| (p.timestamp_ms() as f64, p.total))
        .collect();
    let line = fit_line(&points, method)?;

    let fitted: Vec<FittedPoint> = daily.iter().map(|p| fitted_point(&line, p.date)).collect();
    let (r_squared, rmse) = goodness_of_fit(&points, &line);

    let forecast = match daily.last() {
        Some(last) => (1..=u64::from(forecast_days))
            .filter_map(|k| last.date.checked_add_days(Days::new(k)))
            .map(|date| fitted_point(&line, date))
            .collect(),
        None => Vec::new(),
    };

    Ok(RegressionResult {
        method,
        slope: line.slope,
        intercept: line.intercept,
        n: line.n,
        r_squared,
        rmse,
        fitted,
        forecast,
    })
}

fn fitted_point(line: &LineFit, date: NaiveDate) -> FittedPoint {
    let point = DailyPoint { date, total: 0.0 };
    let timestamp_ms = point.timestamp_ms();
    FittedPoint {
        x: point.key(),
        timestamp_ms,
        y: line.predict(timestamp_ms as f64),
    }
}

/// `(R², RMSE)` of the line against the observations.
///
/// A flat series that the line reproduces exactly reports `R² = 1`.
fn goodness_of_fit(points: &[(f64, f64)], line: &LineFit) -> (f64, f64) {
    let n = points.len() as f64;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;

    let sse: f64 = points.iter().map(|&(x, y)| (y - line.predict(x)).powi(2)).sum();
    let sst: f64 = points.iter().map(|&(_, y)| (y - y_mean).powi(2)).sum();

    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };
    (r_squared, (sse / n).sqrt())
}
