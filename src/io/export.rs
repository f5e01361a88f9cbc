//! Export aggregate series to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! One row per bucket: `kind,key,label,total`.

use std::fs::File;
use std::path::Path;

use crate::domain::SalesReport;
use crate::error::AppError;
use crate::locale::Locale;

/// Write daily, monthly, weekday, and fitted-trend series to a CSV file.
pub fn write_series_csv(path: &Path, report: &SalesReport, locale: Locale) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::io(format!("Failed to write export CSV row: {e}"));

    writer.write_record(["kind", "key", "label", "total"]).map_err(write_err)?;

    for p in &report.daily {
        let key = p.key();
        writer
            .write_record(["daily", key.as_str(), key.as_str(), fmt_total(p.total).as_str()])
            .map_err(write_err)?;
    }
    for p in &report.monthly {
        writer
            .write_record(["monthly", p.key().as_str(), p.label(locale).as_str(), fmt_total(p.total).as_str()])
            .map_err(write_err)?;
    }
    for p in &report.weekday {
        writer
            .write_record(["weekday", p.key().as_str(), p.label(locale), fmt_total(p.total).as_str()])
            .map_err(write_err)?;
    }
    if let Ok(trend) = &report.trend {
        for p in trend.fitted.iter().chain(trend.forecast.iter()) {
            writer
                .write_record(["trend", p.x.as_str(), p.x.as_str(), fmt_total(p.y).as_str()])
                .map_err(write_err)?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn fmt_total(v: f64) -> String {
    format!("{v:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{AnalyzeOptions, analyze};
    use crate::domain::{CellValue, ColumnSpec, RawRow, RawTable};

    fn two_day_report() -> SalesReport {
        let columns = ColumnSpec::default();
        let headers = vec![columns.invoice.clone(), columns.date.clone(), columns.amount.clone()];
        let rows = [("F-1", "2024-01-01", "100,5"), ("F-2", "2024-01-02", "200")]
            .iter()
            .map(|(invoice, date, amount)| {
                RawRow::new(vec![
                    (columns.invoice.clone(), CellValue::Text(invoice.to_string())),
                    (columns.date.clone(), CellValue::Text(date.to_string())),
                    (columns.amount.clone(), CellValue::Text(amount.to_string())),
                ])
            })
            .collect();
        let options = AnalyzeOptions {
            forecast_days: 1,
            ..AnalyzeOptions::default()
        };
        analyze(RawTable { headers, rows }, &options, "memory").unwrap()
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn series_csv_has_every_kind_with_localized_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_series_csv(&path, &two_day_report(), Locale::Es).unwrap();

        let (headers, rows) = read_rows(&path);
        assert_eq!(headers, vec!["kind", "key", "label", "total"]);

        let of_kind = |kind: &str| rows.iter().filter(|r| r[0] == kind).cloned().collect::<Vec<_>>();
        assert_eq!(
            of_kind("daily"),
            vec![
                vec!["daily", "2024-01-01", "2024-01-01", "100.5000"],
                vec!["daily", "2024-01-02", "2024-01-02", "200.0000"],
            ]
        );
        assert_eq!(of_kind("monthly"), vec![vec!["monthly", "2024-01", "Enero 2024", "300.5000"]]);
        assert_eq!(
            of_kind("weekday"),
            vec![
                vec!["weekday", "1", "Lunes", "100.5000"],
                vec!["weekday", "2", "Martes", "200.0000"],
            ]
        );

        // Two fitted days then one forecast day.
        let trend = of_kind("trend");
        let days: Vec<&str> = trend.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(days, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        for row in &trend {
            let (_, decimals) = row[3].split_once('.').unwrap();
            assert_eq!(decimals.len(), 4);
            assert_eq!(row[1], row[2]);
        }
        let forecast: f64 = trend[2][3].parse().unwrap();
        assert!((forecast - 299.5).abs() < 1e-2);
    }

    #[test]
    fn english_labels_follow_the_locale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_series_csv(&path, &two_day_report(), Locale::En).unwrap();

        let (_, rows) = read_rows(&path);
        assert!(rows.iter().any(|r| r[0] == "monthly" && r[2] == "January 2024"));
        assert!(rows.iter().any(|r| r[0] == "weekday" && r[2] == "Monday"));
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("series.csv");
        let err = write_series_csv(&path, &two_day_report(), Locale::Es).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
