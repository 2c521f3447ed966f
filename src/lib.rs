// Food computer dashboard - telemetry chart engine and service layers
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
