//! `sales-trends` library crate.
//!
//! Invoice spreadsheet analysis: duplicate invoice numbers, summary
//! statistics, calendar aggregates and a linear trend over daily totals.
//!
//! The binary (`sales`) is a thin wrapper around this library so the pipeline
//! stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod locale;
pub mod math;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
