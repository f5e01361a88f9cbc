//! Duplicate invoice detection.

use std::collections::HashMap;

use crate::domain::{CanonicalRow, CellValue};

/// Hashable view of an invoice-number cell.
///
/// Text and numbers are distinct keys: `"1"` and `1` never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InvoiceKey<'a> {
    Empty,
    Text(&'a str),
    Number(u64),
    Bool(bool),
}

impl<'a> InvoiceKey<'a> {
    fn of(cell: &'a CellValue) -> Self {
        match cell {
            CellValue::Empty => InvoiceKey::Empty,
            CellValue::Text(s) => InvoiceKey::Text(s),
            // `-0.0 == 0.0`, so both hash as positive zero.
            CellValue::Number(v) if *v == 0.0 => InvoiceKey::Number(0f64.to_bits()),
            CellValue::Number(v) => InvoiceKey::Number(v.to_bits()),
            CellValue::Bool(b) => InvoiceKey::Bool(*b),
        }
    }
}

/// Indices of rows whose invoice number occurs more than once.
///
/// Indices are ascending, i.e. in original row order.
pub fn duplicate_indices(rows: &[CanonicalRow], invoice_column: &str) -> Vec<usize> {
    let mut counts: HashMap<InvoiceKey<'_>, usize> = HashMap::with_capacity(rows.len());
    for row in rows {
        *counts.entry(InvoiceKey::of(row.raw.get(invoice_column))).or_insert(0) += 1;
    }

    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            counts
                .get(&InvoiceKey::of(row.raw.get(invoice_column)))
                .is_some_and(|&n| n > 1)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Rows whose invoice number occurs more than once, in original order.
pub fn find_duplicates<'a>(rows: &'a [CanonicalRow], invoice_column: &str) -> Vec<&'a CanonicalRow> {
    duplicate_indices(rows, invoice_column)
        .into_iter()
        .map(|idx| &rows[idx])
        .collect()
}
