// Chart engine - model, controller and render geometry
pub mod geometry;
pub mod model;
pub mod scale;
pub mod ticks;
pub mod update;

pub use geometry::ChartFrame;
pub use model::ChartModel;
pub use update::{Action, ChartSettings, DragAction, Effect, Update, update};
