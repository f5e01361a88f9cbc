//! Plotters-powered daily sales chart widget for Ratatui.
//!
//! Plotters gives nicer axis and mesh rendering than Ratatui's built-in
//! `Chart`; its output lands in the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description. Series and bounds are computed by the
/// caller so `render()` only draws.
pub struct SalesPlottersChart<'a> {
    /// Trend line (fitted days followed by forecast days).
    pub line: &'a [(f64, f64)],
    /// Observed daily totals.
    pub points: &'a [(f64, f64)],
    /// Forecast part of the line, highlighted.
    pub forecast: &'a [(f64, f64)],
    /// X bounds (days since 1970-01-01).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl Widget for SalesPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are clutter at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255);
            let forecast_color = RGBColor(255, 200, 0);

            chart.draw_series(LineSeries::new(self.line.iter().copied(), &line_color))?;

            // `Circle` radii come out wrong through this backend, so points are pixels.
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
            chart.draw_series(
                self.forecast
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), forecast_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
