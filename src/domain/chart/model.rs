// Chart model - everything the controller mutates between renders
use super::update::MAX_VIEWPORT;
use crate::domain::doc::Marker;
use crate::domain::series::SeriesView;
use serde::Serialize;

/// Which of the three chart screens should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// No batch has been processed yet.
    Loading,
    /// Data arrived but nothing was chartable.
    Empty,
    Data,
}

/// Draggable pan handle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scrubber {
    pub is_dragging: bool,
    pub coords: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct ChartModel {
    pub series: SeriesView,
    pub markers: Vec<Marker>,
    pub recipe_start: Option<f64>,
    pub recipe_end: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub scrubber: Scrubber,
    /// Crosshair position as a fraction of the viewport width.
    pub xhair_at: f64,
    pub loaded: bool,
}

impl ChartModel {
    /// A fresh chart with the scrubber parked at the right edge, showing the
    /// newest data.
    pub fn new(series: SeriesView, width: u32, height: u32) -> Self {
        let width = width.min(MAX_VIEWPORT);
        let height = height.min(MAX_VIEWPORT);
        Self {
            series,
            markers: Vec::new(),
            recipe_start: None,
            recipe_end: None,
            width,
            height,
            scrubber: Scrubber {
                is_dragging: false,
                coords: (width as f64, 0.0),
            },
            xhair_at: 1.0,
            loaded: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.point_count() < 1
    }

    pub fn view_state(&self) -> ViewState {
        if !self.loaded {
            ViewState::Loading
        } else if self.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Data
        }
    }
}
