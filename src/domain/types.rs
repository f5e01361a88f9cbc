//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built fresh for every processed file and dropped afterwards
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::locale::Locale;

/// Header of the invoice date column in the source workbooks.
pub const DEFAULT_DATE_COLUMN: &str = "FECHA DE LA FACTURA";
/// Header of the invoice total column.
pub const DEFAULT_AMOUNT_COLUMN: &str = "IMPORTE TOTAL DE LA VENTA";
/// Header of the invoice number column.
pub const DEFAULT_INVOICE_COLUMN: &str = "Nº DE LA FACTURA";

/// One decoded spreadsheet cell.
///
/// Equality is strict: `Number(1.0)` never equals `Text("1")`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{s}"),
            // Integral values print without a trailing `.0`, the way a sheet shows them.
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A row as read from the sheet: header name -> cell, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    fields: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    /// Look up a column by exact (case-sensitive) header name.
    ///
    /// Absent columns read as [`CellValue::Empty`].
    pub fn get(&self, column: &str) -> &CellValue {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    pub fn fields(&self) -> &[(String, CellValue)] {
        &self.fields
    }

    /// True when every cell is empty (such rows are dropped on decode).
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

/// First-sheet contents: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A raw row plus the two pipeline-derived fields.
///
/// Unparseable inputs degrade to `None` / `NaN`; they never fail the run.
#[derive(Debug, Clone)]
pub struct CanonicalRow {
    pub raw: RawRow,
    pub date: Option<DateTime<Utc>>,
    pub amount: f64,
}

impl CanonicalRow {
    pub fn has_amount(&self) -> bool {
        !self.amount.is_nan()
    }

    /// `(date, amount)` when both derived fields are usable.
    pub fn dated_amount(&self) -> Option<(DateTime<Utc>, f64)> {
        match self.date {
            Some(date) if self.has_amount() => Some((date, self.amount)),
            _ => None,
        }
    }
}

/// Names of the three required columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub date: String,
    pub amount: String,
    pub invoice: String,
}

impl ColumnSpec {
    /// Required columns in reporting order: date, amount, invoice number.
    pub fn required(&self) -> [&str; 3] {
        [&self.date, &self.amount, &self.invoice]
    }
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_COLUMN.to_string(),
            amount: DEFAULT_AMOUNT_COLUMN.to_string(),
            invoice: DEFAULT_INVOICE_COLUMN.to_string(),
        }
    }
}

/// Summary statistics over every row with a valid amount.
///
/// Values are kept at full precision; rounding to two decimals happens at
/// display time only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Population standard deviation (divides by `n`).
    pub std_dev: f64,
}

/// Sales total for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub total: f64,
}

impl DailyPoint {
    /// ISO `YYYY-MM-DD` bucket key.
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Milliseconds since the Unix epoch at UTC midnight.
    pub fn timestamp_ms(&self) -> i64 {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default()
    }
}

/// Sales total for one `(year, month)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: i32,
    /// Calendar month, `1..=12`.
    pub month: u32,
    pub total: f64,
}

impl MonthlyPoint {
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn label(&self, locale: Locale) -> String {
        format!("{} {}", locale.month_name(self.month), self.year)
    }
}

/// Sales total for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayPoint {
    /// `0 = Sunday .. 6 = Saturday`.
    pub day: u32,
    pub total: f64,
    /// Fraction of the weekday grand total, `0.0..=1.0`.
    pub share: f64,
}

impl WeekdayPoint {
    pub fn key(&self) -> String {
        self.day.to_string()
    }

    pub fn weekday(&self) -> Weekday {
        weekday_from_sunday(self.day)
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        locale.weekday_name(self.weekday())
    }
}

pub fn weekday_from_sunday(day: u32) -> Weekday {
    match day % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Which estimator produces the trend line.
///
/// All three are algebraically equivalent; they differ only in rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrendMethod {
    /// `(nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`.
    Sums,
    /// `Σ(x−x̄)(y−ȳ) / Σ(x−x̄)²`.
    Centered,
    /// SVD least squares on a centered `[1, x]` design matrix.
    Lstsq,
}

/// One point on the fitted line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    /// ISO date label.
    pub x: String,
    pub timestamp_ms: i64,
    pub y: f64,
}

/// Least-squares trend over the daily series.
///
/// `x` is the UTC-midnight timestamp in milliseconds, so `slope` is in
/// currency units per millisecond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub method: TrendMethod,
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
    pub r_squared: f64,
    pub rmse: f64,
    pub fitted: Vec<FittedPoint>,
    /// Line extended past the last observed day (empty unless requested).
    pub forecast: Vec<FittedPoint>,
}

impl RegressionResult {
    pub fn predict(&self, timestamp_ms: f64) -> f64 {
        self.slope * timestamp_ms + self.intercept
    }

    pub fn slope_per_day(&self) -> f64 {
        self.slope * 86_400_000.0
    }
}

/// Informational, aggregate-level outcomes. These are not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "notice")]
pub enum Notice {
    /// No row has a parseable amount.
    NoValidData,
    /// No row has both a parseable date and amount.
    NoDatedData,
    /// Fewer than two distinct days for a trend line.
    InsufficientData { points: usize },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoValidData => write!(f, "no valid data: no row has a numeric amount"),
            Notice::NoDatedData => write!(f, "no valid data: no row has both a date and an amount"),
            Notice::InsufficientData { points } => {
                write!(f, "insufficient data: a trend needs at least 2 days, got {points}")
            }
        }
    }
}

/// How many rows degraded to sentinels during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseStats {
    pub rows: usize,
    pub invalid_amounts: usize,
    pub invalid_dates: usize,
}

/// Everything one processing run produces.
#[derive(Debug, Clone)]
pub struct SalesReport {
    pub source: String,
    pub columns: ColumnSpec,
    pub headers: Vec<String>,
    pub rows: Vec<CanonicalRow>,
    pub duplicates: Vec<CanonicalRow>,
    pub summary: Result<SummaryStats, Notice>,
    pub daily: Vec<DailyPoint>,
    pub monthly: Vec<MonthlyPoint>,
    pub weekday: Vec<WeekdayPoint>,
    pub trend: Result<RegressionResult, Notice>,
    pub parse_stats: ParseStats,
}

/// The single state a front-end renders from.
///
/// One tagged value instead of independent flags, so "success with an
/// error also set" cannot be represented.
#[derive(Debug, Clone, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading { path: PathBuf, token: u64 },
    Success(Box<SalesReport>),
    Failure(AppError),
}

impl PipelineState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PipelineState::Loading { .. })
    }

    pub fn report(&self) -> Option<&SalesReport> {
        match self {
            PipelineState::Success(report) => Some(report),
            _ => None,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub columns: ColumnSpec,
    pub locale: Locale,
    pub method: TrendMethod,
    pub preview_rows: usize,
    pub forecast_days: u32,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_series: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
    pub debug: bool,
    pub strict: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            columns: ColumnSpec::default(),
            locale: Locale::Es,
            method: TrendMethod::Sums,
            preview_rows: 10,
            forecast_days: 0,
            plot: true,
            plot_width: 100,
            plot_height: 20,
            export_series: None,
            export_report: None,
            debug: false,
            strict: false,
        }
    }
}

/// A saved report (JSON): aggregates only, never the raw rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub source: String,
    pub locale: Locale,
    pub rows: usize,
    pub duplicates: usize,
    pub summary: Option<SummaryStats>,
    pub daily: Vec<DailyPoint>,
    pub monthly: Vec<MonthlyPoint>,
    pub weekday: Vec<WeekdayPoint>,
    pub trend: Option<RegressionResult>,
    pub notices: Vec<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_lookup_is_exact() {
        let row = RawRow::new(vec![
            ("Nº DE LA FACTURA".to_string(), CellValue::Number(7.0)),
            ("cliente".to_string(), CellValue::Text("ACME".to_string())),
        ]);
        assert_eq!(row.get("Nº DE LA FACTURA"), &CellValue::Number(7.0));
        assert_eq!(row.get("nº de la factura"), &CellValue::Empty);
        assert!(!row.contains("CLIENTE"));
    }

    #[test]
    fn cell_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(45292.0).to_string(), "45292");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn daily_point_timestamp_is_utc_midnight() {
        let p = DailyPoint {
            date: NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(),
            total: 0.0,
        };
        assert_eq!(p.timestamp_ms(), 86_400_000);
        assert_eq!(p.key(), "1970-01-02");
    }

    #[test]
    fn weekday_index_round_trips_through_chrono() {
        for day in 0..7 {
            assert_eq!(weekday_from_sunday(day).num_days_from_sunday(), day);
        }
    }
}
