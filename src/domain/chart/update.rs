// Chart controller - actions, effects and the update step
use super::model::ChartModel;
use crate::domain::doc::{self, Doc, Marker};
use std::time::Duration;

/// Points kept per line after each batch.
pub const DEFAULT_LINE_LIMIT: usize = 500;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);
/// Largest accepted viewport edge, in pixels.
pub const MAX_VIEWPORT: u32 = 16_384;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub line_limit: usize,
    pub tick_interval: Duration,
    /// Offset from UTC used for every time label, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            line_limit: DEFAULT_LINE_LIMIT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            utc_offset_minutes: 0,
        }
    }
}

/// Scrubber sub-protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragAction {
    Hold,
    Release,
    /// Pointer moved; only honoured while dragging.
    Move(f64, f64),
    /// Programmatic placement, honoured regardless of drag state.
    Drag(f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Resize { width: u32, height: u32 },
    Tick,
    AddData(Vec<Doc>),
    DropMarker,
    MoveXhair(f64),
    Scrubber(DragAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Tick => "tick",
            Self::AddData(_) => "add_data",
            Self::DropMarker => "drop_marker",
            Self::MoveXhair(_) => "move_xhair",
            Self::Scrubber(_) => "scrubber",
        }
    }
}

/// Side effects requested by an update; the caller performs them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Schedule { after: Duration, action: Action },
}

#[derive(Debug, Clone)]
pub struct Update {
    pub model: ChartModel,
    pub effect: Effect,
    /// False when the update produced nothing observable.
    pub changed: bool,
}

impl Update {
    fn changed(model: ChartModel) -> Self {
        Self {
            model,
            effect: Effect::None,
            changed: true,
        }
    }

    fn unchanged(model: ChartModel) -> Self {
        Self {
            model,
            effect: Effect::None,
            changed: false,
        }
    }
}

/// Apply `action` to `model` at wall-clock time `now` (milliseconds).
pub fn update(model: ChartModel, action: Action, now: f64, settings: &ChartSettings) -> Update {
    match action {
        Action::Resize { width, height } => Update::changed(ChartModel {
            width: width.min(MAX_VIEWPORT),
            height: height.min(MAX_VIEWPORT),
            ..model
        }),
        Action::Tick => {
            let series = model.series.clone().tick(now);
            let changed = !series.same_as(&model.series);
            Update {
                model: ChartModel { series, ..model },
                effect: Effect::Schedule {
                    after: settings.tick_interval,
                    action: Action::Tick,
                },
                changed,
            }
        }
        Action::AddData(docs) => add_data(model, &docs, now, settings),
        Action::DropMarker => {
            let mut model = model;
            model.markers.push(Marker::new(now, ""));
            Update::changed(model)
        }
        Action::MoveXhair(ratio) => Update::changed(ChartModel {
            xhair_at: ratio,
            ..model
        }),
        Action::Scrubber(drag) => scrub(model, drag),
    }
}

fn add_data(model: ChartModel, docs: &[Doc], now: f64, settings: &ChartSettings) -> Update {
    let start = doc::most_recent_recipe_start(docs);
    let recipe_start = if doc::is_later(start, model.recipe_start) {
        start
    } else {
        model.recipe_start
    };
    let end = doc::most_recent_recipe_end(docs);
    let recipe_end = if doc::is_later(end, model.recipe_end) {
        end
    } else {
        model.recipe_end
    };

    let mut markers = model.markers.clone();
    let markers_changed = merge_markers(&mut markers, docs);

    let series = model
        .series
        .clone()
        .advance_many(docs, now, settings.line_limit);

    let changed = recipe_start != model.recipe_start
        || recipe_end != model.recipe_end
        || markers_changed
        || !series.same_as(&model.series)
        || !model.loaded;
    if !changed {
        return Update::unchanged(model);
    }

    Update::changed(ChartModel {
        series,
        markers,
        recipe_start,
        recipe_end,
        loaded: true,
        ..model
    })
}

/// Merge marker documents into `markers`, keeping them ordered by time and
/// skipping markers already present with the same timestamp and label.
fn merge_markers(markers: &mut Vec<Marker>, docs: &[Doc]) -> bool {
    let mut changed = false;
    for marker in docs.iter().filter_map(doc::read_marker) {
        let start = markers.partition_point(|m| m.timestamp < marker.timestamp);
        let end = markers.partition_point(|m| m.timestamp <= marker.timestamp);
        if markers[start..end].iter().any(|m| m.label == marker.label) {
            continue;
        }
        markers.insert(end, marker);
        changed = true;
    }
    changed
}

fn scrub(model: ChartModel, drag: DragAction) -> Update {
    let mut scrubber = model.scrubber;
    match drag {
        DragAction::Hold => scrubber.is_dragging = true,
        DragAction::Release => scrubber.is_dragging = false,
        DragAction::Move(x, y) if scrubber.is_dragging => scrubber.coords = (x, y),
        DragAction::Move(..) => return Update::unchanged(model),
        DragAction::Drag(x, y) => scrubber.coords = (x, y),
    }
    Update::changed(ChartModel { scrubber, ..model })
}
