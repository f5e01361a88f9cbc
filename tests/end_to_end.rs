use std::path::Path;

use rust_xlsxwriter::Workbook;

use sales_trends::app::pipeline::{AnalyzeOptions, run_file};
use sales_trends::domain::{
    DEFAULT_AMOUNT_COLUMN, DEFAULT_DATE_COLUMN, DEFAULT_INVOICE_COLUMN, Notice, RunConfig, TrendMethod,
};
use sales_trends::error::ErrorKind;
use sales_trends::io::report_file::{read_report_json, write_report_json};
use sales_trends::locale::Locale;

const HEADERS: [&str; 4] = [DEFAULT_INVOICE_COLUMN, DEFAULT_DATE_COLUMN, "CLIENTE", DEFAULT_AMOUNT_COLUMN];

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

fn write_xlsx(path: &Path, rows: &[[Cell<'_>; 4]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32 + 1, c as u16);
            match cell {
                Cell::Text(s) => sheet.write_string(r, c, *s).map(|_| ()).unwrap(),
                Cell::Number(v) => sheet.write_number(r, c, *v).map(|_| ()).unwrap(),
            }
        }
    }
    workbook.save(path).unwrap();
}

#[test]
fn xlsx_with_serial_dates_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ventas.xlsx");
    use Cell::{Number as N, Text as T};
    write_xlsx(
        &path,
        &[
            [T("F-1"), N(45292.0), T("Luna"), N(100.0)],
            [T("F-2"), N(45293.0), T("Sol"), T("200,50 €")],
            [T("F-2"), N(45293.0), T("Sol"), T("200,50 €")],
            [T("F-3"), T("2024-01-05"), T("Olmo"), T("n/d")],
            [T("F-4"), N(45296.0), T("Ruiz"), N(300.0)],
        ],
    );

    let options = AnalyzeOptions {
        method: TrendMethod::Centered,
        forecast_days: 3,
        ..AnalyzeOptions::default()
    };
    let report = run_file(&path, &options).unwrap();

    assert_eq!(report.rows.len(), 5);
    assert_eq!(report.parse_stats.invalid_amounts, 1);
    assert_eq!(report.parse_stats.invalid_dates, 0);
    assert_eq!(report.duplicates.len(), 2);

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.count, 4);
    assert!((summary.max - 300.0).abs() < 1e-9);
    assert!((summary.min - 100.0).abs() < 1e-9);

    let days: Vec<String> = report.daily.iter().map(|p| p.key()).collect();
    assert_eq!(days, vec!["2024-01-01", "2024-01-02", "2024-01-05"]);
    assert!((report.daily[1].total - 401.0).abs() < 1e-9);

    assert_eq!(report.monthly.len(), 1);
    assert_eq!(report.monthly[0].label(Locale::Es), "Enero 2024");

    let trend = report.trend.as_ref().unwrap();
    assert_eq!(trend.n, 3);
    assert_eq!(trend.forecast.len(), 3);
    assert_eq!(trend.forecast[0].x, "2024-01-06");
}

#[test]
fn csv_without_numeric_amounts_still_previews_and_flags_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ventas.csv");
    let body = format!(
        "{}\n1001,2024-03-01,Luna,pendiente\n1001,2024-03-02,Luna,pendiente\n1002,2024-03-02,Sol,\n",
        HEADERS.join(",")
    );
    std::fs::write(&path, body).unwrap();

    let report = run_file(&path, &AnalyzeOptions::default()).unwrap();
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.summary, Err(Notice::NoValidData));
    assert_eq!(report.trend.as_ref().unwrap_err(), &Notice::NoDatedData);
    assert!(report.daily.is_empty());
    assert_eq!(report.duplicates.len(), 2);

    let text = sales_trends::report::format_report(&report, &RunConfig::default());
    assert!(text.contains("Vista Previa de los Datos (3/3):"));
    assert!(text.contains(&Locale::Es.notice(&Notice::NoValidData)));
}

#[test]
fn missing_columns_are_named_and_fail_with_exit_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("otra.csv");
    std::fs::write(&path, format!("{},total\n2024-01-01,10\n", DEFAULT_DATE_COLUMN)).unwrap();

    let err = run_file(&path, &AnalyzeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingColumns);
    assert_eq!(err.exit_code(), 2);
    assert!(err.message().contains(DEFAULT_AMOUNT_COLUMN));
    assert!(err.message().contains(DEFAULT_INVOICE_COLUMN));
}

#[test]
fn saved_report_keeps_aggregates_and_notices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ventas.csv");
    std::fs::write(
        &path,
        format!("{}\nF-1,2024-01-01,Luna,10\n", HEADERS.join(",")),
    )
    .unwrap();
    let report = run_file(&path, &AnalyzeOptions::default()).unwrap();
    assert_eq!(report.trend.as_ref().unwrap_err(), &Notice::InsufficientData { points: 1 });

    let json = dir.path().join("report.json");
    write_report_json(&json, &report, Locale::En).unwrap();
    let saved = read_report_json(&json).unwrap();
    assert_eq!(saved.rows, 1);
    assert_eq!(saved.daily, report.daily);
    assert!(saved.trend.is_none());
    assert!(saved.notices.contains(&Notice::InsufficientData { points: 1 }));
}
