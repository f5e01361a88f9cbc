//! Trend fitting.
//!
//! Responsibilities:
//!
//! - fit a straight line through `(x, y)` pairs (three estimators)
//! - turn a daily series into a trend with goodness-of-fit and forecast

pub mod linear;
pub mod trend;

pub use linear::*;
pub use trend::*;
