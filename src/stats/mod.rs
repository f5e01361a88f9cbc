//! Row-level analytics: duplicate invoices, summary statistics, and
//! time-bucketed totals.

pub mod buckets;
pub mod duplicates;
pub mod summary;

pub use buckets::*;
pub use duplicates::*;
pub use summary::*;
