//! Chart rendering for aggregated series.
//!
//! Charts are described as plain data ([`BarChart`], [`LineChart`]) and handed
//! to a [`ChartRenderer`]. The shipped renderer writes SVG through plotters.

use crate::error::RenderError;
use chat_core::config::ChartConfig;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

/// Upper bound on x-axis tick labels so long histories stay legible.
const MAX_X_LABELS: usize = 16;

/// One bar per x label.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub labels: Vec<String>,
    pub values: Vec<usize>,
    /// Print each non-zero value above its bar.
    pub value_labels: bool,
    pub color_index: usize,
}

/// One line per named series, all sharing the x labels.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub labels: Vec<String>,
    pub lines: Vec<(String, Vec<usize>)>,
}

/// Writes chart images. Implementations must produce a valid image for
/// charts with no data.
pub trait ChartRenderer {
    /// File extension of produced images, without the dot.
    fn extension(&self) -> &'static str;

    fn render_bars(&self, path: &Path, chart: &BarChart) -> Result<(), RenderError>;

    fn render_lines(&self, path: &Path, chart: &LineChart) -> Result<(), RenderError>;
}

/// SVG renderer backed by plotters.
#[derive(Debug, Clone)]
pub struct SvgCharts {
    width: u32,
    height: u32,
}

impl SvgCharts {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.width, config.height)
    }
}

impl Default for SvgCharts {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl ChartRenderer for SvgCharts {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render_bars(&self, path: &Path, chart: &BarChart) -> Result<(), RenderError> {
        if chart.labels.len() != chart.values.len() {
            return Err(RenderError::LengthMismatch {
                labels: chart.labels.len(),
                values: chart.values.len(),
            });
        }

        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(RenderError::backend)?;

        let y_max = y_upper(chart.values.iter().copied());
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range(chart.labels.len()), 0f64..y_max)
            .map_err(RenderError::backend)?;

        draw_mesh(&mut ctx, &chart.labels, &chart.x_desc, &chart.y_desc)?;

        if chart.values.is_empty() {
            draw_no_data(&mut ctx, y_max)?;
        }

        let color = Palette99::pick(chart.color_index).mix(0.7);
        ctx.draw_series(chart.values.iter().enumerate().map(|(i, &v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v as f64)], color.filled())
        }))
        .map_err(RenderError::backend)?;

        if chart.value_labels {
            let style = TextStyle::from(("sans-serif", 14).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            ctx.draw_series(
                chart
                    .values
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| v > 0)
                    .map(|(i, &v)| Text::new(v.to_string(), (i as f64, v as f64), style.clone())),
            )
            .map_err(RenderError::backend)?;
        }

        root.present().map_err(RenderError::backend)?;
        Ok(())
    }

    fn render_lines(&self, path: &Path, chart: &LineChart) -> Result<(), RenderError> {
        if let Some((_, values)) = chart
            .lines
            .iter()
            .find(|(_, values)| values.len() != chart.labels.len())
        {
            return Err(RenderError::LengthMismatch {
                labels: chart.labels.len(),
                values: values.len(),
            });
        }

        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(RenderError::backend)?;

        let y_max = y_upper(chart.lines.iter().flat_map(|(_, v)| v.iter().copied()));
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range(chart.labels.len()), 0f64..y_max)
            .map_err(RenderError::backend)?;

        draw_mesh(&mut ctx, &chart.labels, &chart.x_desc, &chart.y_desc)?;

        if chart.lines.is_empty() || chart.labels.is_empty() {
            draw_no_data(&mut ctx, y_max)?;
        }

        for (idx, (name, values)) in chart.lines.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let style = color.stroke_width(2);
            let points: Vec<(f64, f64)> = values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v as f64))
                .collect();

            ctx.draw_series(LineSeries::new(points.iter().copied(), style))
                .map_err(RenderError::backend)?
                .label(name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            ctx.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                .map_err(RenderError::backend)?;
        }

        if !chart.lines.is_empty() {
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(RenderError::backend)?;
        }

        root.present().map_err(RenderError::backend)?;
        Ok(())
    }
}

type Ctx<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Bars and points sit on integer x positions; pad half a slot either side.
fn x_range(len: usize) -> Range<f64> {
    -0.5..(len.max(1) as f64 - 0.5)
}

fn y_upper(values: impl Iterator<Item = usize>) -> f64 {
    values.max().unwrap_or(0).max(1) as f64 * 1.1
}

fn draw_mesh(ctx: &mut Ctx<'_, '_>, labels: &[String], x_desc: &str, y_desc: &str) -> Result<(), RenderError> {
    let formatter = |x: &f64| tick_label(labels, *x);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(labels.len().clamp(1, MAX_X_LABELS))
        .x_label_formatter(&formatter)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()
        .map_err(RenderError::backend)
}

fn draw_no_data(ctx: &mut Ctx<'_, '_>, y_max: f64) -> Result<(), RenderError> {
    let style = TextStyle::from(("sans-serif", 24).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    ctx.draw_series(std::iter::once(Text::new("No data", (0.0, y_max / 2.0), style)))
        .map_err(RenderError::backend)?;
    Ok(())
}

/// Label for ticks that land on a bucket; ticks between buckets stay blank.
fn tick_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}
