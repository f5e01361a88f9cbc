//! Ratatui-based terminal dashboard.
//!
//! The left pane lists spreadsheets found under the working directory; Enter
//! processes the selected one on a background thread (see
//! [`crate::app::loader`]). The right pane shows one view of the finished run
//! at a time, cycled with Tab.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::app::loader::Loader;
use crate::app::pipeline::AnalyzeOptions;
use crate::cli::TuiArgs;
use crate::cli::picker::{discover_input_files, pretty_path};
use crate::domain::{ColumnSpec, PipelineState, RunConfig, SalesReport, TrendMethod};
use crate::error::AppError;
use crate::locale::Locale;

mod plotters_chart;

use plotters_chart::SalesPlottersChart;

const MS_PER_DAY: f64 = 86_400_000.0;
/// Forecast horizon step for `+`/`-`.
const FORECAST_STEP: u32 = 7;
const DEBUG_DIR: &str = "debug";

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let mut files = discover_input_files();
    if let Some(file) = &args.file {
        if !files.contains(file) {
            files.insert(0, file.clone());
        }
    }
    let mut app = App::new(&args, files);
    if let Some(file) = args.file {
        app.load(file);
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::internal(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::internal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::internal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Overview,
    Preview,
    Daily,
    Monthly,
    Weekday,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Overview => View::Preview,
            View::Preview => View::Daily,
            View::Daily => View::Monthly,
            View::Monthly => View::Weekday,
            View::Weekday => View::Overview,
        }
    }

    fn title(self, locale: Locale) -> &'static str {
        let labels = locale.labels();
        match self {
            View::Overview => labels.summary,
            View::Preview => labels.preview,
            View::Daily => labels.daily,
            View::Monthly => labels.monthly,
            View::Weekday => labels.weekday,
        }
    }
}

struct App {
    loader: Loader,
    state: PipelineState,
    files: Vec<PathBuf>,
    selected: usize,
    view: View,
    locale: Locale,
    columns: ColumnSpec,
    method: TrendMethod,
    forecast_days: u32,
    /// File behind the current (or last) run, for reloads.
    current: Option<PathBuf>,
    status: String,
}

impl App {
    fn new(args: &TuiArgs, files: Vec<PathBuf>) -> Self {
        let columns = args.columns.spec();
        let options = AnalyzeOptions {
            columns: columns.clone(),
            method: args.method,
            forecast_days: args.forecast,
            locale: args.columns.locale,
        };
        let status = if files.is_empty() {
            "No spreadsheets found under the current directory.".to_string()
        } else {
            format!("{} file(s). Enter to load.", files.len())
        };
        Self {
            loader: Loader::new(options),
            state: PipelineState::Idle,
            files,
            selected: 0,
            view: View::Overview,
            locale: args.columns.locale,
            columns,
            method: args.method,
            forecast_days: args.forecast,
            current: None,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_loader() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::internal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::internal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::internal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        // Whatever is still running has nobody to report to.
        self.loader.cancel();
        Ok(())
    }

    /// Fold a finished run into the state. Returns `true` when something changed.
    fn poll_loader(&mut self) -> bool {
        if !self.loader.apply(&mut self.state) {
            return false;
        }
        self.status = match &self.state {
            PipelineState::Success(report) => format!(
                "{} | {} | {}",
                match &report.summary {
                    Ok(_) => self.locale.labels().success.to_string(),
                    Err(notice) => self.locale.notice(notice),
                },
                report.source,
                self.locale.duplicate_count(report.duplicates.len())
            ),
            PipelineState::Failure(err) => format!("Error: {err}"),
            PipelineState::Idle | PipelineState::Loading { .. } => String::new(),
        };
        true
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.state.is_loading() {
                    self.loader.cancel();
                    self.state = PipelineState::Idle;
                    self.status = "Load canceled.".to_string();
                } else {
                    return true;
                }
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.files.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(path) = self.files.get(self.selected).cloned() {
                    self.load(path);
                }
            }
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Char('l') => {
                self.locale = self.locale.next();
                self.status = format!("locale: {:?}", self.locale);
            }
            KeyCode::Char('m') => {
                self.method = next_method(self.method);
                self.status = format!("method: {:?}", self.method);
                self.reload();
            }
            KeyCode::Char('+') => {
                self.forecast_days = self.forecast_days.saturating_add(FORECAST_STEP);
                self.status = format!("forecast: {} days", self.forecast_days);
                self.reload();
            }
            KeyCode::Char('-') => {
                self.forecast_days = self.forecast_days.saturating_sub(FORECAST_STEP);
                self.status = format!("forecast: {} days", self.forecast_days);
                self.reload();
            }
            KeyCode::Char('r') => {
                self.files = discover_input_files();
                self.selected = self.selected.min(self.files.len().saturating_sub(1));
                self.status = format!("{} file(s).", self.files.len());
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn load(&mut self, path: PathBuf) {
        self.loader.set_options(AnalyzeOptions {
            columns: self.columns.clone(),
            method: self.method,
            forecast_days: self.forecast_days,
            locale: self.locale,
        });
        self.status = format!("Loading {}...", pretty_path(&path));
        self.current = Some(path.clone());
        self.loader.begin(path, &mut self.state);
    }

    fn reload(&mut self) {
        if let Some(path) = self.current.clone() {
            self.load(path);
        }
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            columns: self.columns.clone(),
            locale: self.locale,
            method: self.method,
            forecast_days: self.forecast_days,
            ..RunConfig::default()
        }
    }

    fn write_debug(&mut self) {
        let Some(report) = self.state.report() else {
            self.status = "No report loaded.".to_string();
            return;
        };
        self.status = match crate::debug::write_debug_bundle(report, &self.run_config(), Path::new(DEBUG_DIR)) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(chunks[1]);
        self.draw_files(frame, body[0]);
        self.draw_view(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = vec![Line::from(vec![
            Span::styled("sales", Style::default().fg(Color::Cyan)),
            Span::raw(" - invoice analysis"),
        ])];

        let source = match &self.state {
            PipelineState::Idle => "-".to_string(),
            PipelineState::Loading { path, .. } => format!("{} (loading)", pretty_path(path)),
            PipelineState::Success(report) => format!(
                "{} | rows={} | unparsed amounts={}",
                report.source, report.parse_stats.rows, report.parse_stats.invalid_amounts
            ),
            PipelineState::Failure(_) => "failed".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "file: {source} | method: {:?} | forecast: {}d | locale: {:?}",
                self.method, self.forecast_days, self.locale
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_files(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .files
            .iter()
            .map(|p| ListItem::new(pretty_path(p)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Files").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.files.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_view(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(self.view.title(self.locale))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let report = match &self.state {
            PipelineState::Success(report) => report,
            PipelineState::Idle => {
                frame.render_widget(message("Select a file and press Enter.", Color::Gray), inner);
                return;
            }
            PipelineState::Loading { path, .. } => {
                let msg = format!("Processing {}...", pretty_path(path));
                frame.render_widget(message(&msg, Color::Yellow), inner);
                return;
            }
            PipelineState::Failure(err) => {
                let msg = format!("{err} (exit code {})", err.exit_code());
                frame.render_widget(message(&msg, Color::Red), inner);
                return;
            }
        };

        match self.view {
            View::Overview => self.draw_overview(frame, inner, report),
            View::Preview => self.draw_preview(frame, inner, report),
            View::Daily => self.draw_daily(frame, inner, report),
            View::Monthly => {
                let bars: Vec<(String, f64)> = report
                    .monthly
                    .iter()
                    .map(|p| (p.label(self.locale), p.total))
                    .collect();
                draw_bars(frame, inner, &bars);
            }
            View::Weekday => {
                let bars: Vec<(String, f64)> = report
                    .weekday
                    .iter()
                    .map(|p| (format!("{} {:.0}%", p.label(self.locale), p.share * 100.0), p.total))
                    .collect();
                draw_bars(frame, inner, &bars);
            }
        }
    }

    fn draw_overview(&self, frame: &mut ratatui::Frame<'_>, area: Rect, report: &SalesReport) {
        let mut text = String::new();
        text.push_str(&crate::report::format_summary(&report.summary, self.locale));
        text.push('\n');
        text.push_str(&crate::report::format_duplicates(report, self.locale));
        text.push('\n');
        text.push_str(&crate::report::format_trend(&report.trend, self.locale));
        frame.render_widget(Paragraph::new(text), area);
    }

    fn draw_preview(&self, frame: &mut ratatui::Frame<'_>, area: Rect, report: &SalesReport) {
        let labels = self.locale.labels();
        let visible = usize::from(area.height.saturating_sub(1));

        let mut header: Vec<String> = report.headers.clone();
        header.push(labels.date.to_string());
        header.push(labels.amount.to_string());

        let rows: Vec<Row> = report
            .rows
            .iter()
            .take(visible)
            .map(|row| {
                let mut cells: Vec<String> = report.headers.iter().map(|h| row.raw.get(h).to_string()).collect();
                cells.push(row.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string()));
                cells.push(if row.has_amount() { format!("{:.2}", row.amount) } else { "NaN".to_string() });
                Row::new(cells)
            })
            .collect();

        let widths = vec![Constraint::Min(10); header.len()];
        let table = Table::new(rows, widths).header(
            Row::new(header).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(table, area);
    }

    fn draw_daily(&self, frame: &mut ratatui::Frame<'_>, area: Rect, report: &SalesReport) {
        let Some(series) = daily_chart_series(report) else {
            let text = match &report.trend {
                Err(notice) => self.locale.notice(notice),
                Ok(_) => "-".to_string(),
            };
            frame.render_widget(message(&text, Color::Yellow), area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let caption = match &report.trend {
            Ok(t) => format!(
                "{:?}: {:+.2}/day | R²={:.3} | RMSE={:.2}",
                t.method,
                t.slope_per_day(),
                t.r_squared,
                t.rmse
            ),
            Err(notice) => self.locale.notice(notice),
        };
        frame.render_widget(
            Paragraph::new(caption).style(Style::default().fg(Color::Gray)),
            chunks[0],
        );

        let (chart_rect, insets) = chart_layout(chunks[1]);
        let widget = SalesPlottersChart {
            line: &series.line,
            points: &series.points,
            forecast: &series.forecast,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "day",
            y_label: self.locale.labels().amount,
            fmt_x: fmt_axis_day,
            fmt_y: fmt_axis_amount,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, chunks[1], chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ file  Enter load  Tab view  m method  +/- forecast  l locale  r rescan  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn message(text: &str, color: Color) -> Paragraph<'static> {
    Paragraph::new(text.to_string()).style(Style::default().fg(color))
}

fn next_method(cur: TrendMethod) -> TrendMethod {
    match cur {
        TrendMethod::Sums => TrendMethod::Centered,
        TrendMethod::Centered => TrendMethod::Lstsq,
        TrendMethod::Lstsq => TrendMethod::Sums,
    }
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, bars: &[(String, f64)]) {
    if bars.is_empty() {
        frame.render_widget(message("(no data)", Color::Gray), area);
        return;
    }

    let count = bars.len() as u16;
    let bar_width = (area.width.saturating_sub(count) / count.max(1)).clamp(3, 14);
    let data: Vec<Bar> = bars
        .iter()
        .map(|(label, total)| {
            Bar::default()
                .label(Line::from(label.clone()))
                .value(total.max(0.0).round() as u64)
                .text_value(format!("{total:.0}"))
        })
        .collect();

    let chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(BarGroup::default().bars(&data));
    frame.render_widget(chart, area);
}

/// Daily series in chart coordinates (x = days since 1970-01-01).
#[derive(Debug, Clone, PartialEq)]
struct DailySeries {
    points: Vec<(f64, f64)>,
    line: Vec<(f64, f64)>,
    forecast: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn daily_chart_series(report: &SalesReport) -> Option<DailySeries> {
    if report.daily.is_empty() {
        return None;
    }

    let to_day = |ms: i64| ms as f64 / MS_PER_DAY;
    let points: Vec<(f64, f64)> = report
        .daily
        .iter()
        .map(|p| (to_day(p.timestamp_ms()), p.total))
        .collect();
    let (line, forecast) = match &report.trend {
        Ok(t) => (
            t.fitted
                .iter()
                .chain(&t.forecast)
                .map(|p| (to_day(p.timestamp_ms), p.y))
                .collect(),
            t.forecast.iter().map(|p| (to_day(p.timestamp_ms), p.y)).collect(),
        ),
        Err(_) => (Vec::new(), Vec::new()),
    };

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points.iter().chain(&line) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(DailySeries {
        points,
        line,
        forecast,
        x_bounds: [x_min, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn fmt_axis_day(v: f64) -> String {
    chrono::DateTime::from_timestamp_millis((v * MS_PER_DAY).round() as i64)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_amount(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_day(x_bounds[0] + u * (x_bounds[1] - x_bounds[0]));
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_amount(y_bounds[0] + u * (y_bounds[1] - y_bounds[0]));
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("day")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}
