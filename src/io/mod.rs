//! Input/output helpers.
//!
//! - spreadsheet decoding (`workbook`)
//! - schema validation + canonical rows (`ingest`, `parse`)
//! - series CSV export (`export`)
//! - report JSON read/write (`report_file`)

pub mod export;
pub mod ingest;
pub mod parse;
pub mod report_file;
pub mod workbook;

pub use export::*;
pub use ingest::*;
pub use parse::*;
pub use report_file::*;
pub use workbook::*;
