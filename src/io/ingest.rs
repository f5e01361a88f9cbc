//! Schema validation and row canonicalization.
//!
//! This module turns a decoded [`RawTable`] into [`CanonicalRow`]s:
//!
//! - **Strict schema** for the three required columns, checked before any row
//!   is parsed (clear errors + exit code 2)
//! - **Row-level degradation** instead of row-level errors: a bad amount or
//!   date becomes a sentinel, the row is kept
//! - **Separation of concerns**: no aggregation logic here

use tracing::{debug, warn};

use crate::domain::{CanonicalRow, ColumnSpec, ParseStats, RawRow, RawTable};
use crate::error::{AppError, ErrorKind};
use crate::io::parse::{parse_amount, parse_date};
use crate::locale::Locale;

/// Structural problems that stop a run before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    EmptyTable,
    /// Missing names, in required-column order.
    MissingColumns(Vec<String>),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::EmptyTable => write!(f, "The file contains no data rows."),
            SchemaError::MissingColumns(cols) => {
                write!(f, "Missing required columns: {}", cols.join(", "))
            }
        }
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::EmptyTable => ErrorKind::EmptyTable,
            SchemaError::MissingColumns(_) => ErrorKind::MissingColumns,
        }
    }

    /// Convert to an [`AppError`] whose message is written in `locale`.
    pub fn into_app_error(self, locale: Locale) -> AppError {
        AppError::new(self.kind(), locale.schema_error(&self))
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        err.into_app_error(Locale::En)
    }
}

/// Check that the table has rows and every required column.
pub fn validate_columns(table: &RawTable, columns: &ColumnSpec) -> Result<(), SchemaError> {
    if table.is_empty() {
        return Err(SchemaError::EmptyTable);
    }
    let missing = missing_columns(&table.headers, columns);
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }
    Ok(())
}

/// Required columns absent from `headers`, in required-column order.
pub fn missing_columns(headers: &[String], columns: &ColumnSpec) -> Vec<String> {
    columns
        .required()
        .into_iter()
        .filter(|name| !headers.iter().any(|h| h.as_str() == *name))
        .map(str::to_string)
        .collect()
}

/// Derive the parsed date and amount for one row.
pub fn canonicalize_row(raw: RawRow, columns: &ColumnSpec) -> CanonicalRow {
    let amount = parse_amount(raw.get(&columns.amount));
    let date = parse_date(raw.get(&columns.date));
    CanonicalRow { raw, date, amount }
}

/// Validate, then canonicalize every row of the table.
pub fn canonicalize(table: RawTable, columns: &ColumnSpec) -> Result<(Vec<CanonicalRow>, ParseStats), SchemaError> {
    if let Err(err) = validate_columns(&table, columns) {
        warn!(%err, "schema validation failed");
        return Err(err);
    }

    let mut stats = ParseStats {
        rows: table.rows.len(),
        ..ParseStats::default()
    };
    let rows: Vec<CanonicalRow> = table
        .rows
        .into_iter()
        .map(|raw| canonicalize_row(raw, columns))
        .inspect(|row| {
            if !row.has_amount() {
                stats.invalid_amounts += 1;
            }
            if row.date.is_none() {
                stats.invalid_dates += 1;
            }
        })
        .collect();

    debug!(
        rows = stats.rows,
        invalid_amounts = stats.invalid_amounts,
        invalid_dates = stats.invalid_dates,
        "rows canonicalized"
    );
    Ok((rows, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellValue;

    fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| RawRow::new(headers.iter().cloned().zip(values).collect()))
            .collect();
        RawTable { headers, rows }
    }

    fn spec() -> ColumnSpec {
        ColumnSpec {
            date: "date".to_string(),
            amount: "amount".to_string(),
            invoice: "invoice".to_string(),
        }
    }

    #[test]
    fn empty_table_is_reported() {
        let t = table(&["date", "amount", "invoice"], vec![]);
        assert_eq!(validate_columns(&t, &spec()), Err(SchemaError::EmptyTable));
    }

    #[test]
    fn missing_columns_in_required_order() {
        let t = table(&["invoice", "other"], vec![vec![CellValue::Number(1.0), CellValue::Empty]]);
        assert_eq!(
            validate_columns(&t, &spec()),
            Err(SchemaError::MissingColumns(vec!["date".to_string(), "amount".to_string()]))
        );

        let t = table(&["amount", "date"], vec![vec![CellValue::Number(1.0), CellValue::Empty]]);
        assert_eq!(
            validate_columns(&t, &spec()),
            Err(SchemaError::MissingColumns(vec!["invoice".to_string()]))
        );
    }

    #[test]
    fn column_match_is_case_sensitive() {
        let headers = vec!["DATE".to_string(), "amount".to_string(), "invoice".to_string()];
        assert_eq!(missing_columns(&headers, &spec()), vec!["date".to_string()]);
    }

    #[test]
    fn schema_error_maps_to_exit_code_two() {
        let err: AppError = SchemaError::MissingColumns(vec!["date".to_string()]).into();
        assert_eq!(err.kind(), ErrorKind::MissingColumns);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn canonicalize_keeps_bad_rows() {
        let t = table(
            &["date", "amount", "invoice"],
            vec![
                vec![CellValue::Number(45292.0), CellValue::Text("10,5".into()), CellValue::Number(1.0)],
                vec![CellValue::Text("garbage".into()), CellValue::Text("n/a".into()), CellValue::Number(2.0)],
            ],
        );
        let (rows, stats) = canonicalize(t, &spec()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 10.5);
        assert!(rows[0].date.is_some());
        assert!(rows[1].amount.is_nan());
        assert!(rows[1].date.is_none());
        assert_eq!(
            stats,
            ParseStats {
                rows: 2,
                invalid_amounts: 1,
                invalid_dates: 1
            }
        );
    }
}
