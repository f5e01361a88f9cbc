//! Spreadsheet decoding: file bytes -> [`RawTable`].
//!
//! Only the first sheet is read. The first row supplies the column names;
//! every following non-blank row becomes one [`RawRow`]. Workbook formats go
//! through `calamine`; plain `.csv` exports go through `csv`, with numeric
//! looking fields typed as numbers so date serials behave the same in both.

use std::collections::HashMap;
use std::io::Cursor;
use std::iter;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, info};

use crate::domain::{CellValue, RawRow, RawTable};
use crate::error::AppError;

/// File extensions the decoder accepts (lowercase).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

/// Prefix for columns whose header cell is blank.
const BLANK_HEADER: &str = "__EMPTY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            e if SUPPORTED_EXTENSIONS.contains(&e) => Ok(SourceFormat::Workbook),
            _ => Err(AppError::io(format!(
                "Unsupported file type '{}'. Expected one of: {}.",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

/// Read a file from disk and decode its first sheet.
pub fn read_table(path: &Path) -> Result<RawTable, AppError> {
    let format = SourceFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| {
        AppError::io(format!(
            "Failed to read '{}'. Make sure the file exists and is not corrupt: {e}",
            path.display()
        ))
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "file read");
    decode_table(bytes, format)
}

pub fn decode_table(bytes: Vec<u8>, format: SourceFormat) -> Result<RawTable, AppError> {
    let table = match format {
        SourceFormat::Workbook => decode_workbook(bytes)?,
        SourceFormat::Csv => decode_csv(&bytes)?,
    };
    debug!(rows = table.len(), columns = table.headers.len(), "table decoded");
    Ok(table)
}

/// Decode the first worksheet of an xlsx/xls/xlsb/ods workbook.
pub fn decode_workbook(bytes: Vec<u8>) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::io(format!("Failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::io("The workbook has no sheets."))?
        .map_err(|e| AppError::io(format!("Failed to read the first sheet: {e}")))?;

    Ok(table_from_rows(
        range.rows().map(|row| row.iter().map(cell_from_data).collect()),
    ))
}

/// Decode a CSV export (first record is the header row).
pub fn decode_csv(bytes: &[u8]) -> Result<RawTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::io(format!("Failed to parse CSV: {e}")))?;
        rows.push(record.iter().map(cell_from_csv).collect::<Vec<_>>());
    }
    Ok(table_from_rows(rows))
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        // Date-formatted cells keep their serial so the row parser sees a number.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

fn cell_from_csv(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    if looks_numeric(field) {
        if let Ok(v) = field.parse::<f64>() {
            if v.is_finite() {
                return CellValue::Number(v);
            }
        }
    }
    CellValue::Text(field.to_string())
}

/// Plain decimal/scientific notation only; `inf`, `NaN`, and `1,5` stay text.
fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

/// Build a table from positional rows, the first being the header row.
pub fn table_from_rows<I>(rows: I) -> RawTable
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let mut rows = rows.into_iter();
    let Some(header_cells) = rows.next() else {
        return RawTable::default();
    };
    let headers = header_names(&header_cells);

    let data = rows
        .map(|cells| {
            let fields = headers
                .iter()
                .cloned()
                .zip(cells.into_iter().chain(iter::repeat(CellValue::Empty)))
                .collect();
            RawRow::new(fields)
        })
        .filter(|row| !row.is_blank())
        .collect();

    RawTable { headers, rows: data }
}

/// Header text per column; blanks become `__EMPTY`, repeats get `_1`, `_2`...
fn header_names(cells: &[CellValue]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(cells.len());

    for (idx, cell) in cells.iter().enumerate() {
        let mut name = cell.to_string();
        if idx == 0 {
            // Spreadsheet tools sometimes emit a BOM in front of the first header.
            name = name.trim_start_matches('\u{feff}').to_string();
        }
        if name.is_empty() {
            name = BLANK_HEADER.to_string();
        }

        let count = seen.entry(name.clone()).or_insert(0);
        let unique = if *count == 0 {
            name.clone()
        } else {
            format!("{name}_{count}")
        };
        *count += 1;
        out.push(unique);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.XLSX")).unwrap(), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_path(Path::new("a.xls")).unwrap(), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_path(Path::new("a.csv")).unwrap(), SourceFormat::Csv);
        let err = SourceFormat::from_path(Path::new("a.pdf")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn header_row_keys_each_data_row() {
        let table = table_from_rows(vec![
            vec![text("a"), text("b")],
            vec![CellValue::Number(1.0), text("x")],
            vec![CellValue::Number(2.0)],
        ]);
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("a"), &CellValue::Number(2.0));
        assert_eq!(table.rows[1].get("b"), &CellValue::Empty);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let table = table_from_rows(vec![
            vec![text("a")],
            vec![CellValue::Empty],
            vec![CellValue::Number(3.0)],
        ]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn blank_and_repeated_headers_get_unique_names() {
        let names = header_names(&[text("\u{feff}id"), CellValue::Empty, text("id"), CellValue::Empty]);
        assert_eq!(names, vec!["id", "__EMPTY", "id_1", "__EMPTY_1"]);
    }

    #[test]
    fn header_only_sheet_is_empty_table() {
        let table = table_from_rows(vec![vec![text("a"), text("b")]]);
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn csv_fields_are_typed() {
        let data = "FECHA,IMPORTE,Nº\n45292,\"1.234,56\",A-1\n2024-01-02,99.5,7\n";
        let table = decode_csv(data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["FECHA", "IMPORTE", "Nº"]);
        assert_eq!(table.rows[0].get("FECHA"), &CellValue::Number(45292.0));
        assert_eq!(table.rows[0].get("IMPORTE"), &text("1.234,56"));
        assert_eq!(table.rows[0].get("Nº"), &text("A-1"));
        assert_eq!(table.rows[1].get("FECHA"), &text("2024-01-02"));
        assert_eq!(table.rows[1].get("Nº"), &CellValue::Number(7.0));
    }

    #[test]
    fn corrupt_workbook_is_io_error() {
        let err = decode_workbook(b"definitely not a zip".to_vec()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
