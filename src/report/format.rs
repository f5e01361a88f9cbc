//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the parsing/aggregation code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::domain::{
    CanonicalRow, DailyPoint, MonthlyPoint, Notice, RegressionResult, RunConfig, SalesReport, SummaryStats,
    WeekdayPoint,
};
use crate::locale::Locale;
use crate::stats::round2;

/// Width of one raw column in the preview table.
const PREVIEW_COL: usize = 16;

/// Everything `sales analyze` prints before the plots.
pub fn format_report(report: &SalesReport, config: &RunConfig) -> String {
    let locale = config.locale;
    let mut out = String::new();

    out.push_str(&format_run_header(report, locale));
    out.push('\n');
    out.push_str(&format_preview(&report.headers, &report.rows, config.preview_rows, locale));
    out.push('\n');
    out.push_str(&format_summary(&report.summary, locale));
    out.push('\n');
    out.push_str(&format_duplicates(report, locale));
    out.push('\n');
    out.push_str(&format_daily(&report.daily, locale));
    out.push('\n');
    out.push_str(&format_monthly(&report.monthly, locale));
    out.push('\n');
    out.push_str(&format_weekday(&report.weekday, locale));
    out.push('\n');
    out.push_str(&format_trend(&report.trend, locale));

    out
}

pub fn format_run_header(report: &SalesReport, locale: Locale) -> String {
    let mut out = String::new();
    out.push_str("=== sales - Invoice Analysis ===\n");
    out.push_str(&format!("Source: {}\n", report.source));
    out.push_str(&format!(
        "Rows: n={} | unparsed amounts={} | unparsed dates={}\n",
        report.parse_stats.rows, report.parse_stats.invalid_amounts, report.parse_stats.invalid_dates
    ));
    // A file with no usable amount is reported through the summary notice instead.
    if report.summary.is_ok() {
        out.push_str(locale.labels().success);
        out.push('\n');
    }
    out
}

/// First `limit` rows: every source column plus the parsed date and amount.
pub fn format_preview(headers: &[String], rows: &[CanonicalRow], limit: usize, locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = String::new();
    out.push_str(&format!("{} ({}/{}):\n", labels.preview, rows.len().min(limit), rows.len()));

    let mut header_cells: Vec<String> = headers.iter().map(|h| cell(h, PREVIEW_COL)).collect();
    header_cells.push(format!("{:<10}", labels.date));
    header_cells.push(format!("{:>12}", labels.amount));
    push_line(&mut out, &header_cells.join(" "));

    let mut rule: Vec<String> = headers.iter().map(|_| "-".repeat(PREVIEW_COL)).collect();
    rule.push("-".repeat(10));
    rule.push("-".repeat(12));
    push_line(&mut out, &rule.join(" "));

    for row in rows.iter().take(limit) {
        let mut cells: Vec<String> = headers
            .iter()
            .map(|h| cell(&row.raw.get(h).to_string(), PREVIEW_COL))
            .collect();
        cells.push(format!("{:<10}", fmt_date(row)));
        cells.push(format!("{:>12}", fmt_amount(row.amount)));
        push_line(&mut out, &cells.join(" "));
    }

    out
}

pub fn format_summary(summary: &Result<SummaryStats, Notice>, locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("{}:\n", labels.summary);
    match summary {
        Ok(s) => {
            for (label, value) in [
                (labels.mean, s.mean),
                (labels.max, s.max),
                (labels.min, s.min),
                (labels.std_dev, s.std_dev),
            ] {
                out.push_str(&format!("  {label:<12} {:>14.2}\n", round2(value)));
            }
        }
        Err(notice) => {
            out.push_str(&format!("  {}\n", locale.notice(notice)));
        }
    }
    out
}

pub fn format_duplicates(report: &SalesReport, locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("{}:\n", labels.duplicates);
    if report.duplicates.is_empty() {
        out.push_str(&format!("  {}\n", labels.no_duplicates));
        return out;
    }

    out.push_str(&format!("  {}\n", locale.duplicate_count(report.duplicates.len())));
    let invoice = &report.columns.invoice;
    push_line(
        &mut out,
        &format!("  {} {:<10} {:>12}", cell(invoice, 20), labels.date, labels.amount),
    );
    for row in &report.duplicates {
        push_line(
            &mut out,
            &format!(
                "  {} {:<10} {:>12}",
                cell(&row.raw.get(invoice).to_string(), 20),
                fmt_date(row),
                fmt_amount(row.amount)
            ),
        );
    }
    out
}

pub fn format_daily(daily: &[DailyPoint], locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("{}:\n", labels.daily);
    if daily.is_empty() {
        out.push_str(&format!("  {}\n", locale.notice(&Notice::NoDatedData)));
        return out;
    }
    for p in daily {
        out.push_str(&format!("  {:<12} {:>14.2}\n", p.key(), p.total));
    }
    out
}

pub fn format_monthly(monthly: &[MonthlyPoint], locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("{}:\n", labels.monthly);
    if monthly.is_empty() {
        out.push_str(&format!("  {}\n", locale.notice(&Notice::NoDatedData)));
        return out;
    }
    for p in monthly {
        out.push_str(&format!("  {:<16} {:>14.2}\n", p.label(locale), p.total));
    }
    out
}

pub fn format_weekday(weekday: &[WeekdayPoint], locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = format!("{}:\n", labels.weekday);
    if weekday.is_empty() {
        out.push_str(&format!("  {}\n", locale.notice(&Notice::NoDatedData)));
        return out;
    }
    for p in weekday {
        out.push_str(&format!(
            "  {:<10} {:>14.2} {:>6.1}%\n",
            p.label(locale),
            p.total,
            p.share * 100.0
        ));
    }
    out
}

pub fn format_trend(trend: &Result<RegressionResult, Notice>, locale: Locale) -> String {
    let mut out = format!("{}:\n", locale.labels().trend);
    let t = match trend {
        Ok(t) => t,
        Err(notice) => {
            out.push_str(&format!("  {}\n", locale.notice(notice)));
            return out;
        }
    };

    out.push_str(&format!("  method    : {:?}\n", t.method));
    out.push_str(&format!("  n         : {}\n", t.n));
    out.push_str(&format!("  slope/day : {:.4}\n", t.slope_per_day()));
    out.push_str(&format!("  slope/ms  : {:.6e}\n", t.slope));
    out.push_str(&format!("  intercept : {:.4}\n", t.intercept));
    out.push_str(&format!("  R²        : {:.4}\n", t.r_squared));
    out.push_str(&format!("  RMSE      : {:.2}\n", t.rmse));
    if !t.forecast.is_empty() {
        out.push_str("  forecast:\n");
        for p in &t.forecast {
            out.push_str(&format!("    {:<12} {:>14.2}\n", p.x, p.y));
        }
    }
    out
}

fn fmt_date(row: &CanonicalRow) -> String {
    match row.date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

fn fmt_amount(v: f64) -> String {
    if v.is_nan() { "NaN".to_string() } else { format!("{v:.2}") }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Left-aligned, fixed-width cell.
fn cell(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
