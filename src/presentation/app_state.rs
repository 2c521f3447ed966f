// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub chart_service: Arc<ChartService>,
}
