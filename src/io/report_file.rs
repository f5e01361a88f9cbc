//! Read/write report JSON files.
//!
//! The report JSON is the "portable" representation of a run:
//! - summary statistics
//! - daily / monthly / weekday series
//! - the fitted trend (and forecast, if any)
//!
//! Raw rows are never written. The schema is defined by `domain::ReportFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{ReportFile, SalesReport};
use crate::error::AppError;
use crate::locale::Locale;

/// Build the serializable view of a report.
pub fn to_report_file(report: &SalesReport, locale: Locale) -> ReportFile {
    let mut notices = Vec::new();
    if let Err(n) = &report.summary {
        notices.push(*n);
    }
    if let Err(n) = &report.trend {
        notices.push(*n);
    }

    ReportFile {
        tool: "sales".to_string(),
        source: report.source.clone(),
        locale,
        rows: report.rows.len(),
        duplicates: report.duplicates.len(),
        summary: report.summary.ok(),
        daily: report.daily.clone(),
        monthly: report.monthly.clone(),
        weekday: report.weekday.clone(),
        trend: report.trend.as_ref().ok().cloned(),
        notices,
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &SalesReport, locale: Locale) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &to_report_file(report, locale))
        .map_err(|e| AppError::io(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: ReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
