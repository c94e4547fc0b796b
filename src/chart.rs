//! Grouped bar chart of a benchmark report.
//!
//! Groups are operations, bars inside a group are backends. The time axis is
//! either logarithmic or linear; on a log axis the bars are drawn over
//! `log10(seconds)` and the tick labels are mapped back to seconds.

use crate::config::TimeScale;
use crate::errors::{BenchError, BenchResult};
use crate::report::Report;
use anyhow::Context;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

const TITLE_FONT_SIZE: u32 = 40;
const AXIS_LABEL_FONT_SIZE: u32 = 24;
const TICK_LABEL_FONT_SIZE: u32 = 18;
const LEGEND_FONT_SIZE: u32 = 20;
const DATA_LABEL_FONT_SIZE: u32 = 14;

/// Durations below this are clamped on a log axis.
const LOG_FLOOR_SECS: f64 = 1e-6;

const PALETTE: &[RGBColor] = &[
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub scale: TimeScale,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            scale: TimeScale::Log,
            title: "Framework Performance Comparison".to_string(),
            width: 1800,
            height: 1000,
        }
    }
}

impl TimeScale {
    /// Map seconds onto the chart's y coordinate.
    pub fn project(&self, secs: f64) -> f64 {
        match self {
            TimeScale::Log => secs.max(LOG_FLOOR_SECS).log10(),
            TimeScale::Linear => secs,
        }
    }

    /// Inverse of [`TimeScale::project`].
    pub fn unproject(&self, y: f64) -> f64 {
        match self {
            TimeScale::Log => 10f64.powf(y),
            TimeScale::Linear => y,
        }
    }

    /// y-axis range covering `min_secs..=max_secs` with headroom for labels.
    fn axis_range(&self, min_secs: f64, max_secs: f64) -> (f64, f64) {
        match self {
            TimeScale::Log => {
                let lo = self.project(min_secs).floor();
                let hi = self.project(max_secs).ceil().max(lo + 1.0) + 0.3;
                (lo, hi)
            }
            TimeScale::Linear => {
                let hi = if max_secs > 0.0 { max_secs * 1.15 } else { 1.0 };
                (0.0, hi)
            }
        }
    }

    fn axis_description(&self) -> &'static str {
        match self {
            TimeScale::Log => "Execution Time (seconds) - Log Scale",
            TimeScale::Linear => "Execution Time (seconds)",
        }
    }
}

fn format_secs(secs: f64) -> String {
    if secs >= 1.0 {
        format!("{:.1}s", secs)
    } else if secs >= 1e-3 {
        format!("{:.1}ms", secs * 1e3)
    } else {
        format!("{:.0}µs", secs * 1e6)
    }
}

/// Render `report` as an SVG bar chart at `path`, creating parent directories.
pub fn render_chart<P: AsRef<Path>>(
    report: &Report,
    path: P,
    options: &ChartOptions,
) -> BenchResult<()> {
    if report.is_empty() {
        return Err(BenchError::ChartError("report has no rows to plot".to_string()));
    }
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    draw_grouped_bars(report, path, options)
        .map_err(|e| BenchError::ChartError(format!("{:#}", e)))?;

    info!("Chart saved to {}", path.display());
    Ok(())
}

fn draw_grouped_bars(report: &Report, path: &Path, options: &ChartOptions) -> anyhow::Result<()> {
    let scale = options.scale;
    let operations = report.operations();
    let backends = report.backends();
    let num_ops = operations.len();
    let num_backends = backends.len();

    let min_secs = report
        .rows()
        .iter()
        .map(|r| r.secs())
        .fold(f64::MAX, f64::min);
    let max_secs = report
        .rows()
        .iter()
        .map(|r| r.secs())
        .fold(0.0_f64, f64::max);
    let (y_min, y_max) = scale.axis_range(min_secs, max_secs);
    let label_pad = (y_max - y_min) * 0.01;

    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5..(num_ops as f64 - 0.5), y_min..y_max)
        .context("failed to build chart coordinates")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_ops)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if idx < num_ops && (x - idx as f64).abs() < 0.3 {
                operations[idx].to_string()
            } else {
                String::new()
            }
        })
        .y_label_formatter(&|y| format_secs(scale.unproject(*y)))
        .x_desc("Data Operation")
        .y_desc(scale.axis_description())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let group_width = 0.8;
    let bar_width = group_width / num_backends as f64;

    for (backend_idx, backend) in backends.iter().enumerate() {
        let color = PALETTE[backend_idx % PALETTE.len()];

        for row in report.rows().iter().filter(|r| r.backend == *backend) {
            let Some(op_idx) = operations.iter().position(|op| *op == row.operation) else {
                continue;
            };
            let value = scale.project(row.secs());

            let x_center = op_idx as f64;
            let x_offset = (backend_idx as f64 - (num_backends as f64 - 1.0) / 2.0) * bar_width;
            let x_left = x_center + x_offset - bar_width / 2.0 + 0.01;
            let x_right = x_center + x_offset + bar_width / 2.0 - 0.01;
            let x_mid = (x_left + x_right) / 2.0;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x_left, y_min), (x_right, value)],
                color.filled(),
            )))?;

            chart.draw_series(std::iter::once(Text::new(
                format!("{:.3}", row.secs()),
                (x_mid, value + label_pad),
                ("sans-serif", DATA_LABEL_FONT_SIZE)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Center, VPos::Bottom)),
            )))?;
        }
    }

    for (backend_idx, backend) in backends.iter().enumerate() {
        let color = PALETTE[backend_idx % PALETTE.len()];
        chart
            .draw_series(std::iter::once(Circle::new(
                (num_ops as f64 - 1.0, y_max),
                0,
                color.filled(),
            )))?
            .label(*backend)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;

    root.present()?;
    Ok(())
}
