//! Shared "analyze pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read -> decode -> validate -> parse -> {duplicates, summary, buckets} -> trend
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::domain::{CanonicalRow, ColumnSpec, Notice, RawTable, RunConfig, SalesReport, TrendMethod};
use crate::error::AppError;
use crate::fit::fit_trend;
use crate::io::ingest::canonicalize;
use crate::io::workbook::read_table;
use crate::locale::Locale;
use crate::stats::{daily_totals, find_duplicates, monthly_totals, summarize, weekday_totals};

/// Options that change what a run computes (not how it is displayed).
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub columns: ColumnSpec,
    pub method: TrendMethod,
    pub forecast_days: u32,
    /// Language of structural error messages.
    pub locale: Locale,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            columns: ColumnSpec::default(),
            method: TrendMethod::Sums,
            forecast_days: 0,
            locale: Locale::Es,
        }
    }
}

impl From<&RunConfig> for AnalyzeOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            method: config.method,
            forecast_days: config.forecast_days,
            locale: config.locale,
        }
    }
}

/// Read a spreadsheet from disk and run the full pipeline on it.
pub fn run_file(path: &Path, options: &AnalyzeOptions) -> Result<SalesReport, AppError> {
    let table = read_table(path)?;
    analyze(table, options, &path.display().to_string())
}

/// Run the pipeline on an already-decoded table.
///
/// Structural problems (empty table, missing columns) fail the run.
/// Aggregate-level problems are carried inside the report as notices so
/// the preview and duplicate list are still available.
pub fn analyze(table: RawTable, options: &AnalyzeOptions, source: &str) -> Result<SalesReport, AppError> {
    let started = Instant::now();
    let headers = table.headers.clone();
    let (rows, parse_stats) =
        canonicalize(table, &options.columns).map_err(|e| e.into_app_error(options.locale))?;
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "parse stage done");

    // The three consumers only read the parsed rows, so they run side by side.
    let aggregate_started = Instant::now();
    let ((duplicates, summary), (daily, (monthly, weekday))) = rayon::join(
        || {
            rayon::join(
                || owned_duplicates(&rows, &options.columns.invoice),
                || summarize(&rows),
            )
        },
        || {
            rayon::join(
                || daily_totals(&rows),
                || rayon::join(|| monthly_totals(&rows), || weekday_totals(&rows)),
            )
        },
    );
    debug!(
        elapsed_ms = aggregate_started.elapsed().as_millis() as u64,
        "aggregate stage done"
    );

    let trend = if daily.is_empty() {
        Err(Notice::NoDatedData)
    } else {
        fit_trend(&daily, options.method, options.forecast_days)
    };

    info!(
        source,
        rows = rows.len(),
        duplicates = duplicates.len(),
        days = daily.len(),
        months = monthly.len(),
        trend_ok = trend.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "analysis complete"
    );

    Ok(SalesReport {
        source: source.to_string(),
        columns: options.columns.clone(),
        headers,
        rows,
        duplicates,
        summary,
        daily,
        monthly,
        weekday,
        trend,
        parse_stats,
    })
}

fn owned_duplicates(rows: &[CanonicalRow], invoice_column: &str) -> Vec<CanonicalRow> {
    find_duplicates(rows, invoice_column).into_iter().cloned().collect()
}
