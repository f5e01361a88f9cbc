//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - daily totals: `o`
//! - trend line (fitted + forecast): `-` line
//! - monthly / weekday totals: horizontal `#` bars

use crate::domain::{DailyPoint, MonthlyPoint, RegressionResult, WeekdayPoint};
use crate::locale::Locale;

const MS_PER_DAY: f64 = 86_400_000.0;

/// All charts for one run: daily line with trend, then monthly and weekday bars.
pub fn render_report_plots(
    daily: &[DailyPoint],
    monthly: &[MonthlyPoint],
    weekday: &[WeekdayPoint],
    trend: Option<&RegressionResult>,
    locale: Locale,
    width: usize,
    height: usize,
) -> String {
    let labels = locale.labels();
    let mut out = String::new();

    out.push_str(&format!("{}:\n", labels.daily));
    out.push_str(&render_trend_plot(daily, trend, width, height));
    out.push('\n');

    let months: Vec<(String, f64)> = monthly.iter().map(|p| (p.label(locale), p.total)).collect();
    out.push_str(&format!("{}:\n", labels.monthly));
    out.push_str(&render_bars(&months, None, width));
    out.push('\n');

    let days: Vec<(String, f64)> = weekday
        .iter()
        .map(|p| (p.label(locale).to_string(), p.total))
        .collect();
    let shares: Vec<f64> = weekday.iter().map(|p| p.share).collect();
    out.push_str(&format!("{}:\n", labels.weekday));
    out.push_str(&render_bars(&days, Some(shares.as_slice()), width));

    out
}

/// Daily totals as points, with the trend line drawn underneath.
///
/// The x axis is calendar time, so gaps between sale days stay visible.
pub fn render_trend_plot(
    daily: &[DailyPoint],
    trend: Option<&RegressionResult>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let observed: Vec<(f64, f64)> = daily
        .iter()
        .map(|p| (p.timestamp_ms() as f64 / MS_PER_DAY, p.total))
        .collect();
    let line: Vec<(f64, f64)> = trend
        .map(|t| {
            t.fitted
                .iter()
                .chain(t.forecast.iter())
                .map(|p| (p.timestamp_ms as f64 / MS_PER_DAY, p.y))
                .collect()
        })
        .unwrap_or_default();

    let Some((x_min, x_max)) = x_range(&observed, &line) else {
        return "Plot: (no dated sales)\n".to_string();
    };
    let (y_min, y_max) = y_range(&observed, &line).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the line first so points can overlay.
    draw_curve(&mut grid, &line, x_min, x_max, y_min, y_max);

    for &(x, y) in &observed {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: days=[{}, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        day_label(x_min),
        day_label(x_max)
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Horizontal bar chart; `shares` (0..=1, same length as `bars`) adds a percentage column.
pub fn render_bars(bars: &[(String, f64)], shares: Option<&[f64]>, width: usize) -> String {
    if bars.is_empty() {
        return "(no data)\n".to_string();
    }

    let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let value_width = bars
        .iter()
        .map(|(_, v)| format!("{v:.2}").len())
        .max()
        .unwrap_or(0);
    let bar_width = width.saturating_sub(label_width + value_width + 12).max(10);
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (i, (label, value)) in bars.iter().enumerate() {
        let len = if max > 0.0 && *value > 0.0 {
            ((value / max) * bar_width as f64).round() as usize
        } else {
            0
        };
        let mut line = format!(
            "{label:<label_width$} |{:<bar_width$} {value:>value_width$.2}",
            "#".repeat(len)
        );
        if let Some(share) = shares.and_then(|s| s.get(i)) {
            line.push_str(&format!(" {:>5.1}%", share * 100.0));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn day_label(days_since_epoch: f64) -> String {
    chrono::DateTime::from_timestamp_millis((days_since_epoch * MS_PER_DAY).round() as i64)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn x_range(observed: &[(f64, f64)], line: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in observed.iter().chain(line) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if !(min_x.is_finite() && max_x.is_finite()) {
        return None;
    }
    // A single day still gets a visible axis.
    if max_x > min_x { Some((min_x, max_x)) } else { Some((min_x - 1.0, max_x + 1.0)) }
}

fn y_range(observed: &[(f64, f64)], line: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in observed.iter().chain(line) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
