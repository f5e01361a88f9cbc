//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - reads the spreadsheet and runs the pipeline
//! - prints reports/plots
//! - writes optional exports and the debug bundle

use std::path::Path;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::{AnalyzeArgs, Command, DemoArgs, PlotArgs, TuiArgs};
use crate::data::{SampleConfig, generate_invoices, write_invoices_csv};
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod loader;
pub mod pipeline;

/// Directory the `--debug` bundle is written to.
const DEBUG_DIR: &str = "debug";

/// Entry point for the `sales` binary.
pub fn run() -> Result<(), AppError> {
    // Column names and locale may come from a local .env file.
    dotenvy::dotenv().ok();

    // We want `sales` to open the dashboard and `sales ventas.xlsx` to analyze
    // that file. Clap requires a subcommand name, so rewrite argv first.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // Log lines on stderr would tear through the alternate screen, so the
    // dashboard only logs when asked to explicitly.
    if !matches!(cli.command, Command::Tui(_)) || std::env::var_os("RUST_LOG").is_some() {
        init_logger(cli.log_level);
    }

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Name of the binary target; its log lines use this as their target.
const BIN_NAME: &str = "sales";

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(default_log_filter(level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Filter directives used when `RUST_LOG` is unset: the library and the binary at `level`.
fn default_log_filter(level: LevelFilter) -> String {
    format!("{}={level},{BIN_NAME}={level}", env!("CARGO_CRATE_NAME"))
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(path) => crate::cli::picker::validate_input_path(path)?,
        None => crate::cli::picker::prompt_for_input_path()?,
    };
    let config = run_config_from_args(&args);
    debug!(?config, "analyze");

    let report = pipeline::run_file(&path, &pipeline::AnalyzeOptions::from(&config))?;

    println!("{}", crate::report::format_report(&report, &config));

    if config.plot {
        let plot = crate::plot::render_report_plots(
            &report.daily,
            &report.monthly,
            &report.weekday,
            report.trend.as_ref().ok(),
            config.locale,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(out) = &config.export_series {
        crate::io::export::write_series_csv(out, &report, config.locale)?;
        info!(path = %out.display(), "series exported");
    }
    if let Some(out) = &config.export_report {
        crate::io::report_file::write_report_json(out, &report, config.locale)?;
        info!(path = %out.display(), "report exported");
    }
    if config.debug {
        let written = crate::debug::write_debug_bundle(&report, &config, Path::new(DEBUG_DIR))?;
        eprintln!("Wrote debug bundle: {}", written.display());
    }

    if config.strict {
        if let Err(notice) = report.summary {
            return Err(notice.into());
        }
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let saved = crate::io::report_file::read_report_json(&args.report)?;

    println!("{} ({})", saved.source, saved.tool);
    for notice in &saved.notices {
        println!("{}", saved.locale.notice(notice));
    }
    let plot = crate::plot::render_report_plots(
        &saved.daily,
        &saved.monthly,
        &saved.weekday,
        saved.trend.as_ref(),
        saved.locale,
        args.width,
        args.height,
    );
    println!("{plot}");
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        rows: args.rows,
        seed: args.seed,
        start: args.start,
        days: args.days,
        duplicate_rate: args.duplicate_rate,
        bad_amount_rate: args.bad_amount_rate,
    };
    let invoices = generate_invoices(&config)?;
    write_invoices_csv(&args.out, &invoices, &crate::domain::ColumnSpec::default())?;
    println!("Wrote {} invoices to {}", invoices.len(), args.out.display());
    Ok(())
}

pub fn run_config_from_args(args: &AnalyzeArgs) -> RunConfig {
    RunConfig {
        columns: args.columns.spec(),
        locale: args.columns.locale,
        method: args.method,
        preview_rows: args.preview,
        forecast_days: args.forecast,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_series: args.export_series.clone(),
        export_report: args.export_report.clone(),
        debug: args.debug,
        strict: args.strict,
    }
}

/// Rewrite argv so `sales` defaults to the dashboard.
///
/// Rules:
/// - `sales`                         -> `sales tui`
/// - `sales --locale en ...`         -> `sales tui --locale en ...`
/// - `sales ventas.xlsx ...`         -> `sales analyze -f ventas.xlsx ...`
/// - `sales --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "plot" | "tui" | "demo");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise it names a file to analyze.
    argv.insert(1, "analyze".to_string());
    argv.insert(2, "-f".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("sales")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn default_log_filter_scopes_library_and_binary() {
        let filter = default_log_filter(LevelFilter::WARN);
        assert_eq!(filter, "sales_trends=warn,sales=warn");
        EnvFilter::try_new(&filter).unwrap();
    }

    #[test]
    fn bare_invocation_opens_dashboard() {
        assert_eq!(rewrite_args(argv(&[])), argv(&["tui"]));
        assert_eq!(
            rewrite_args(argv(&["--locale", "en"])),
            argv(&["tui", "--locale", "en"])
        );
    }

    #[test]
    fn file_argument_becomes_analyze() {
        assert_eq!(
            rewrite_args(argv(&["ventas.xlsx", "--no-plot"])),
            argv(&["analyze", "-f", "ventas.xlsx", "--no-plot"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            &["analyze", "-f", "a.csv"][..],
            &["demo", "--out", "d.csv"][..],
            &["--help"][..],
            &["help"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn rewritten_args_parse() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&["ventas.csv", "--forecast", "7"])));
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let config = run_config_from_args(&args);
        assert_eq!(args.file, Some(PathBuf::from("ventas.csv")));
        assert_eq!(config.forecast_days, 7);
        assert!(config.plot);
        assert_eq!(config.columns, crate::domain::ColumnSpec::default());
    }

    #[test]
    fn no_plot_wins() {
        let cli = crate::cli::Cli::parse_from(argv(&["analyze", "-f", "a.csv", "--no-plot"]));
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(!run_config_from_args(&args).plot);
    }
}
