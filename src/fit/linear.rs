//! Straight-line least squares, three ways.
//!
//! - summation form: `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`,
//!   `intercept = (Σy − slope·Σx) / n`
//! - mean-centered form: `slope = Σ(x−x̄)(y−ȳ) / Σ(x−x̄)²`,
//!   `intercept = ȳ − slope·x̄`
//! - matrix form: SVD least squares on a centered, scaled `[1, x]` design
//!
//! The three agree up to floating-point rounding. The centered forms lose
//! less precision when `x` is a large timestamp.

use nalgebra::DVector;

use crate::domain::{Notice, TrendMethod};
use crate::math::{line_design, solve_least_squares};

/// Slope and intercept of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope·x + intercept` with the chosen estimator.
///
/// Needs at least two distinct `x` values, otherwise reports
/// [`Notice::InsufficientData`].
pub fn fit_line(points: &[(f64, f64)], method: TrendMethod) -> Result<LineFit, Notice> {
    match method {
        TrendMethod::Sums => fit_line_sums(points),
        TrendMethod::Centered => fit_line_centered(points),
        TrendMethod::Lstsq => fit_line_lstsq(points),
    }
}

pub fn fit_line_sums(points: &[(f64, f64)]) -> Result<LineFit, Notice> {
    ensure_two_distinct(points)?;
    let n = points.len() as f64;

    let sum_x: f64 = points.iter().map(|p| p.0).sum();
    let sum_y: f64 = points.iter().map(|p| p.1).sum();
    let sum_xy: f64 = points.iter().map(|p| p.0 * p.1).sum();
    let sum_x2: f64 = points.iter().map(|p| p.0 * p.0).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 || !denom.is_finite() {
        return Err(insufficient(points));
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    finite(slope, intercept, points)
}

pub fn fit_line_centered(points: &[(f64, f64)]) -> Result<LineFit, Notice> {
    ensure_two_distinct(points)?;
    let (x_mean, y_mean) = means(points);

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for &(x, y) in points {
        let dx = x - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return Err(insufficient(points));
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    finite(slope, intercept, points)
}

pub fn fit_line_lstsq(points: &[(f64, f64)]) -> Result<LineFit, Notice> {
    ensure_two_distinct(points)?;
    let (x_mean, _) = means(points);

    // Center and scale x to [-1, 1] so the absolute SVD cutoffs are meaningful.
    let scale = points
        .iter()
        .map(|p| (p.0 - x_mean).abs())
        .fold(0.0_f64, f64::max);
    if scale == 0.0 {
        return Err(insufficient(points));
    }
    let xs: Vec<f64> = points.iter().map(|p| (p.0 - x_mean) / scale).collect();
    let y = DVector::from_iterator(points.len(), points.iter().map(|p| p.1));

    let beta = solve_least_squares(&line_design(&xs), &y).ok_or_else(|| insufficient(points))?;
    let slope = beta[1] / scale;
    let intercept = beta[0] - slope * x_mean;

    finite(slope, intercept, points)
}

fn means(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y = points.iter().map(|p| p.1).sum::<f64>() / n;
    (x, y)
}

fn distinct_x(points: &[(f64, f64)]) -> usize {
    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    xs.len()
}

fn ensure_two_distinct(points: &[(f64, f64)]) -> Result<(), Notice> {
    if points.len() < 2 || distinct_x(points) < 2 {
        return Err(insufficient(points));
    }
    Ok(())
}

fn insufficient(points: &[(f64, f64)]) -> Notice {
    Notice::InsufficientData {
        points: distinct_x(points),
    }
}

fn finite(slope: f64, intercept: f64, points: &[(f64, f64)]) -> Result<LineFit, Notice> {
    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(insufficient(points));
    }
    Ok(LineFit {
        slope,
        intercept,
        n: points.len(),
    })
}
