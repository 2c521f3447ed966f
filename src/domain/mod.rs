// Domain layer - pure time-series and chart logic
pub mod chart;
pub mod doc;
pub mod downsample;
pub mod fixed_buffer;
pub mod line;
pub mod point;
pub mod series;
