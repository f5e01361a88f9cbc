//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw and canonical row model (`RawRow`, `CanonicalRow`)
//! - aggregate outputs (`SummaryStats`, `DailyPoint`, `RegressionResult`, etc.)
//! - run configuration and the front-end state (`RunConfig`, `PipelineState`)

pub mod types;

pub use types::*;
