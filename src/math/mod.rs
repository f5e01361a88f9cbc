//! Numerical utilities: matrix least squares.

pub mod ols;

pub use ols::*;
