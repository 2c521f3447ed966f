// Presentation layer - HTTP surface of the chart
pub mod app_state;
pub mod handlers;
