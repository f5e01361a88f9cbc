//! Command-line parsing for the sales-invoice analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the parsing/aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use crate::domain::{
    ColumnSpec, DEFAULT_AMOUNT_COLUMN, DEFAULT_DATE_COLUMN, DEFAULT_INVOICE_COLUMN, TrendMethod,
};
use crate::locale::Locale;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Sales invoice analyzer: duplicates, summaries, and trends")]
pub struct Cli {
    /// Log level for this tool's own messages (overridden by RUST_LOG).
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a spreadsheet and print the report (plus optional plots/exports).
    Analyze(AnalyzeArgs),
    /// Plot a previously exported report JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `sales analyze`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
    /// Write a synthetic invoice table (CSV) for trying the tool out.
    Demo(DemoArgs),
}

/// Names of the required columns.
#[derive(Debug, Args, Clone)]
pub struct ColumnArgs {
    /// Header of the invoice date column.
    #[arg(long, env = "SALES_DATE_COLUMN", default_value = DEFAULT_DATE_COLUMN)]
    pub date_column: String,

    /// Header of the invoice total column.
    #[arg(long, env = "SALES_AMOUNT_COLUMN", default_value = DEFAULT_AMOUNT_COLUMN)]
    pub amount_column: String,

    /// Header of the invoice number column.
    #[arg(long, env = "SALES_INVOICE_COLUMN", default_value = DEFAULT_INVOICE_COLUMN)]
    pub invoice_column: String,

    /// Display language for month/weekday names and labels.
    #[arg(long, value_enum, env = "SALES_LOCALE", default_value_t = Locale::Es)]
    pub locale: Locale,
}

impl ColumnArgs {
    pub fn spec(&self) -> ColumnSpec {
        ColumnSpec {
            date: self.date_column.clone(),
            amount: self.amount_column.clone(),
            invoice: self.invoice_column.clone(),
        }
    }
}

/// Options for a one-shot analysis.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Spreadsheet to analyze (xlsx, xlsm, xlsb, xls, ods, or csv).
    ///
    /// If omitted, you'll be prompted to pick one from the current directory.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub columns: ColumnArgs,

    /// Number of rows shown in the data preview.
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Estimator for the trend line.
    #[arg(long, value_enum, default_value_t = TrendMethod::Sums)]
    pub method: TrendMethod,

    /// Extend the trend line this many days past the last sale.
    #[arg(long, value_name = "DAYS", default_value_t = 0)]
    pub forecast: u32,

    /// Render ASCII plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export daily/monthly/weekday/trend series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_series: Option<PathBuf>,

    /// Export the aggregate report to JSON (readable by `sales plot`).
    #[arg(long, value_name = "JSON")]
    pub export_report: Option<PathBuf>,

    /// Write a Markdown debug bundle next to the working directory.
    #[arg(long)]
    pub debug: bool,

    /// Exit non-zero when summary statistics are unavailable.
    #[arg(long)]
    pub strict: bool,
}

/// Options for plotting a saved report.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Report JSON produced by `sales analyze --export-report`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for the interactive dashboard.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Load this file on start.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub columns: ColumnArgs,

    /// Estimator for the trend line.
    #[arg(long, value_enum, default_value_t = TrendMethod::Sums)]
    pub method: TrendMethod,

    /// Extend the trend line this many days past the last sale.
    #[arg(long, value_name = "DAYS", default_value_t = 0)]
    pub forecast: u32,
}

/// Options for the synthetic invoice generator.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of invoice rows.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub rows: usize,

    /// Random seed (same seed, same file).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First invoice date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Number of calendar days the invoices span.
    #[arg(long, default_value_t = 90)]
    pub days: u32,

    /// Probability that a row reuses an earlier invoice number.
    #[arg(long, default_value_t = 0.03)]
    pub duplicate_rate: f64,

    /// Probability that a row's amount is not a number.
    #[arg(long, default_value_t = 0.02)]
    pub bad_amount_rate: f64,
}
