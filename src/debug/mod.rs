//! Debug bundle writer for inspecting how a file was read and aggregated.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{RunConfig, SalesReport};
use crate::error::AppError;

/// Write `<dir>/sales_debug_<timestamp>.md` and return its path.
pub fn write_debug_bundle(report: &SalesReport, config: &RunConfig, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::io(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("sales_debug_{ts}.md"));

    let mut file = File::create(&path).map_err(|e| AppError::io(format!("Failed to create debug file: {e}")))?;
    file.write_all(render_debug_bundle(report, config).as_bytes())
        .map_err(|e| AppError::io(format!("Failed to write debug: {e}")))?;

    Ok(path)
}

/// Markdown body of the bundle.
pub fn render_debug_bundle(report: &SalesReport, config: &RunConfig) -> String {
    let mut md = String::new();
    // Writing into a String cannot fail.
    let _ = write_bundle(&mut md, report, config);
    md
}

fn write_bundle(md: &mut String, report: &SalesReport, config: &RunConfig) -> std::fmt::Result {
    writeln!(md, "# sales debug bundle")?;
    writeln!(md, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(md, "- source: {}", report.source)?;
    writeln!(
        md,
        "- columns: date=`{}` amount=`{}` invoice=`{}`",
        config.columns.date, config.columns.amount, config.columns.invoice
    )?;
    writeln!(
        md,
        "- locale: {:?} | method: {:?} | forecast_days: {}",
        config.locale, config.method, config.forecast_days
    )?;
    writeln!(
        md,
        "- rows: {} | unparsed amounts: {} | unparsed dates: {} | duplicates: {}",
        report.parse_stats.rows,
        report.parse_stats.invalid_amounts,
        report.parse_stats.invalid_dates,
        report.duplicates.len()
    )?;

    writeln!(md, "\n## Headers")?;
    for (idx, h) in report.headers.iter().enumerate() {
        writeln!(md, "{}. `{}`", idx + 1, h)?;
    }

    writeln!(md, "\n## Degraded rows")?;
    writeln!(md, "| row | date cell | parsed date | amount cell | parsed amount |")?;
    writeln!(md, "| - | - | - | - | - |")?;
    for (idx, row) in report.rows.iter().enumerate() {
        if row.has_amount() && row.date.is_some() {
            continue;
        }
        writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            // Header is row 1; blank sheet rows are not counted.
            idx + 2,
            row.raw.get(&config.columns.date),
            row.date.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
            row.raw.get(&config.columns.amount),
            if row.has_amount() { format!("{:.4}", row.amount) } else { "NaN".to_string() }
        )?;
    }

    writeln!(md, "\n## Summary")?;
    match &report.summary {
        Ok(s) => writeln!(
            md,
            "n={} mean={:.6} max={:.6} min={:.6} std_dev={:.6}",
            s.count, s.mean, s.max, s.min, s.std_dev
        )?,
        Err(notice) => writeln!(md, "{notice}")?,
    }

    writeln!(md, "\n## Daily")?;
    writeln!(md, "| day | timestamp_ms | total |")?;
    writeln!(md, "| - | - | - |")?;
    for p in &report.daily {
        writeln!(md, "| {} | {} | {:.4} |", p.key(), p.timestamp_ms(), p.total)?;
    }

    writeln!(md, "\n## Monthly")?;
    writeln!(md, "| month | total |")?;
    writeln!(md, "| - | - |")?;
    for p in &report.monthly {
        writeln!(md, "| {} | {:.4} |", p.key(), p.total)?;
    }

    writeln!(md, "\n## Weekday")?;
    writeln!(md, "| day | total | share |")?;
    writeln!(md, "| - | - | - |")?;
    for p in &report.weekday {
        writeln!(md, "| {} | {:.4} | {:.4} |", p.day, p.total, p.share)?;
    }

    writeln!(md, "\n## Trend")?;
    match &report.trend {
        Ok(t) => {
            writeln!(md, "- method: {:?}", t.method)?;
            writeln!(md, "- slope (per ms): {:e}", t.slope)?;
            writeln!(md, "- slope (per day): {:.6}", t.slope_per_day())?;
            writeln!(md, "- intercept: {:.6}", t.intercept)?;
            writeln!(md, "- n: {} | r_squared: {:.6} | rmse: {:.6}", t.n, t.r_squared, t.rmse)?;
            writeln!(md, "\n| x | fitted | kind |")?;
            writeln!(md, "| - | - | - |")?;
            for p in &t.fitted {
                writeln!(md, "| {} | {:.4} | fit |", p.x, p.y)?;
            }
            for p in &t.forecast {
                writeln!(md, "| {} | {:.4} | forecast |", p.x, p.y)?;
            }
        }
        Err(notice) => writeln!(md, "{notice}")?,
    }

    Ok(())
}
