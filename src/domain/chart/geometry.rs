// Chart geometry - render-ready frame derived from the chart model
use super::model::{ChartModel, ViewState};
use super::scale::LinearScale;
use super::ticks::{
    AXIS_LABEL_FORMAT, TimeFormatter, XHAIR_DATE_FORMAT, XHAIR_TIME_FORMAT, tick_interval,
    time_ticks,
};
use super::update::ChartSettings;
use crate::domain::line::Line;
use crate::domain::point::display_y_for_x;
use crate::domain::series::Series;
use serde::Serialize;

/// Horizontal density of the plot: 12 pixels per minute.
pub const PX_PER_MS: f64 = 12.0 / 60_000.0;
pub const SCRUBBER_HEIGHT: f64 = 40.0;
pub const TOOLTIP_HEADER_HEIGHT: f64 = 36.0;
pub const TOOLTIP_ROW_HEIGHT: f64 = 20.0;
pub const TOOLTIP_WIDTH: f64 = 240.0;
pub const PLOT_PADDING: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePath {
    pub variable: String,
    pub kind: &'static str,
    pub color: String,
    pub points: Vec<PixelPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLine {
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crosshair {
    /// Position within the viewport.
    pub x: f64,
    pub timestamp: f64,
    pub time_label: String,
    pub date_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub variable: String,
    pub title: String,
    pub color: String,
    pub measured: String,
    pub desired: String,
}

/// Everything a renderer needs to draw the chart. Path, tick and marker x
/// positions are in plot space; subtract `plot_offset` for the viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub view_state: ViewState,
    pub rev: u64,
    pub width: u32,
    pub height: u32,
    pub plot_width: f64,
    pub plot_height: f64,
    pub plot_offset: f64,
    pub lines: Vec<LinePath>,
    pub ticks: Vec<AxisTick>,
    pub recipe_start_x: Option<f64>,
    pub recipe_end_x: Option<f64>,
    pub markers: Vec<MarkerLine>,
    pub xhair: Crosshair,
    pub tooltip_x: f64,
    pub readouts: Vec<Readout>,
}

/// Elapsed time extent in pixels, rounded to whole pixels.
pub fn plot_width(series: &Series) -> f64 {
    match (series.min(), series.max()) {
        (Some(min), Some(max)) => ((max - min) * PX_PER_MS).round(),
        _ => 0.0,
    }
}

/// Viewport height left for the plot once the scrubber strip, the tooltip
/// block and padding are reserved.
pub fn plot_height(height: u32, pairs: usize) -> f64 {
    let tooltip = TOOLTIP_HEADER_HEIGHT + pairs as f64 * TOOLTIP_ROW_HEIGHT;
    (height as f64 - SCRUBBER_HEIGHT - tooltip - 2.0 * PLOT_PADDING).max(0.0)
}

pub fn time_scale(series: &Series, plot_width: f64) -> LinearScale {
    let min = series.min().unwrap_or(0.0);
    let max = series.max().unwrap_or(min);
    LinearScale::new((min, max), (0.0, plot_width))
}

/// Scrubber position to plot pan offset. The offset never exceeds the part of
/// the plot that overflows the viewport.
pub fn scrubber_scale(width: f64, plot_width: f64) -> LinearScale {
    LinearScale::clamped((0.0, width), (0.0, (plot_width - width).max(0.0)))
}

pub fn xhair_scale(width: f64) -> LinearScale {
    LinearScale::clamped((0.0, 1.0), (0.0, width))
}

/// Value scale for one variable: the configured domain when both bounds are
/// set, otherwise the observed extent of its measured and desired lines.
pub fn y_scale(measured: &Line, desired: &Line, plot_height: f64) -> LinearScale {
    let domain = measured.config().fixed_domain().unwrap_or_else(|| {
        let extent = measured
            .points()
            .iter()
            .chain(desired.points())
            .map(|p| p.value)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
        match extent {
            Some((lo, hi)) if hi - lo > 0.0 => (lo, hi),
            Some((lo, _)) => (lo - 0.5, lo + 0.5),
            None => (0.0, 1.0),
        }
    });
    LinearScale::new(domain, (plot_height, 0.0))
}

pub fn tooltip_x(xhair_px: f64, width: f64) -> f64 {
    (xhair_px - TOOLTIP_WIDTH / 2.0).clamp(0.0, (width - TOOLTIP_WIDTH).max(0.0))
}

fn line_path(line: &Line, time: &LinearScale, y: &LinearScale) -> LinePath {
    LinePath {
        variable: line.variable().to_string(),
        kind: line.kind().as_str(),
        color: line.color().to_string(),
        points: line
            .points()
            .iter()
            .map(|p| PixelPoint {
                x: time.map(p.timestamp),
                y: y.map(p.value),
            })
            .collect(),
    }
}

impl ChartFrame {
    pub fn derive(model: &ChartModel, settings: &ChartSettings) -> Self {
        let series = model.series.series();
        let formatter = TimeFormatter::new(settings.utc_offset_minutes);
        let width = model.width as f64;

        let plot_width = plot_width(series);
        let plot_height = plot_height(model.height, series.pairs().count());
        let time = time_scale(series, plot_width);
        let plot_offset = scrubber_scale(width, plot_width).map(model.scrubber.coords.0);

        let xhair_px = xhair_scale(width).map(model.xhair_at);
        let xhair_time = time.invert(plot_offset + xhair_px);

        let mut lines = Vec::new();
        let mut readouts = Vec::new();
        for (measured, desired) in series.pairs() {
            let y = y_scale(measured, desired, plot_height);
            lines.push(line_path(measured, &time, &y));
            lines.push(line_path(desired, &time, &y));
            readouts.push(Readout {
                variable: measured.variable().to_string(),
                title: measured.title().to_string(),
                color: measured.color().to_string(),
                measured: display_y_for_x(measured.points(), xhair_time, measured.unit()),
                desired: display_y_for_x(desired.points(), xhair_time, desired.unit()),
            });
        }

        let ticks = if plot_width > 0.0 {
            let visible_start = time.invert(plot_offset);
            let visible_end = time.invert(plot_offset + width);
            time_ticks(visible_start, visible_end, tick_interval(PX_PER_MS), &formatter)
                .into_iter()
                .map(|t| AxisTick {
                    x: time.map(t),
                    label: formatter.format(t, AXIS_LABEL_FORMAT),
                })
                .collect()
        } else {
            Vec::new()
        };

        let has_data = !series.is_empty();
        let marker_x = |t: f64| has_data.then(|| time.map(t));

        Self {
            view_state: model.view_state(),
            rev: series.rev(),
            width: model.width,
            height: model.height,
            plot_width,
            plot_height,
            plot_offset,
            lines,
            ticks,
            recipe_start_x: model.recipe_start.and_then(marker_x),
            recipe_end_x: model.recipe_end.and_then(marker_x),
            markers: model
                .markers
                .iter()
                .filter_map(|m| {
                    marker_x(m.timestamp).map(|x| MarkerLine {
                        x,
                        label: m.label.clone(),
                    })
                })
                .collect(),
            xhair: Crosshair {
                x: xhair_px,
                timestamp: xhair_time,
                time_label: formatter.format(xhair_time, XHAIR_TIME_FORMAT),
                date_label: formatter.format(xhair_time, XHAIR_DATE_FORMAT),
            },
            tooltip_x: tooltip_x(xhair_px, width),
            readouts,
        }
    }
}
