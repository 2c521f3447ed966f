// HTTP request handlers
use crate::domain::chart::{ChartFrame, DragAction};
use crate::presentation::app_state::AppState;
use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct XhairRequest {
    /// Crosshair position as a fraction of the viewport width.
    pub ratio: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ScrubberRequest {
    Hold,
    Release,
    Move { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
}

impl From<ScrubberRequest> for DragAction {
    fn from(request: ScrubberRequest) -> Self {
        match request {
            ScrubberRequest::Hold => Self::Hold,
            ScrubberRequest::Release => Self::Release,
            ScrubberRequest::Move { x, y } => Self::Move(x, y),
            ScrubberRequest::Drag { x, y } => Self::Drag(x, y),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current render frame
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartFrame> {
    Json(state.chart_service.frame().await)
}

pub async fn resize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResizeRequest>,
) -> Json<ChartFrame> {
    Json(
        state
            .chart_service
            .resize(request.width, request.height)
            .await,
    )
}

pub async fn move_xhair(
    State(state): State<Arc<AppState>>,
    Json(request): Json<XhairRequest>,
) -> Json<ChartFrame> {
    Json(state.chart_service.move_xhair(request.ratio).await)
}

/// Drop a marker at the current time
pub async fn drop_marker(State(state): State<Arc<AppState>>) -> Json<ChartFrame> {
    Json(state.chart_service.drop_marker().await)
}

pub async fn scrubber(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrubberRequest>,
) -> Json<ChartFrame> {
    Json(state.chart_service.scrub(request.into()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_service::ChartService;
    use crate::application::clock::tests::FixedClock;
    use crate::application::document_repository::tests::MemoryRepository;
    use crate::domain::chart::model::ViewState;
    use crate::domain::chart::{ChartModel, ChartSettings};
    use crate::domain::line::tests::air_temperature;
    use crate::domain::series::{Series, SeriesView};
    use serde_json::json;

    fn state() -> Arc<AppState> {
        let series = Series::with_history(&[air_temperature()], 100, Some(2)).unwrap();
        let chart_service = ChartService::new(
            ChartModel::new(SeriesView::new(series), 800, 600),
            ChartSettings::default(),
            Arc::new(MemoryRepository::default()),
            Arc::new(FixedClock::new(0.0)),
        );
        Arc::new(AppState {
            chart_service: Arc::new(chart_service),
        })
    }

    #[test]
    fn test_scrubber_request_shapes() {
        let hold: ScrubberRequest = serde_json::from_value(json!({"action": "hold"})).unwrap();
        assert_eq!(DragAction::from(hold), DragAction::Hold);

        let drag: ScrubberRequest =
            serde_json::from_value(json!({"action": "drag", "x": 12.5, "y": 0})).unwrap();
        assert_eq!(DragAction::from(drag), DragAction::Drag(12.5, 0.0));

        assert!(serde_json::from_value::<ScrubberRequest>(json!({"action": "move"})).is_err());
        assert!(serde_json::from_value::<ScrubberRequest>(json!({"action": "fling"})).is_err());
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "ok");
    }

    #[tokio::test]
    async fn test_frame_endpoints() {
        let state = state();
        let Json(frame) = get_chart(State(state.clone())).await;
        assert_eq!(frame.view_state, ViewState::Loading);

        let Json(frame) = resize(
            State(state.clone()),
            Json(ResizeRequest {
                width: 400,
                height: 300,
            }),
        )
        .await;
        assert_eq!(frame.width, 400);

        let Json(frame) = move_xhair(State(state.clone()), Json(XhairRequest { ratio: 0.25 })).await;
        assert_eq!(frame.xhair.x, 100.0);

        let Json(frame) = drop_marker(State(state)).await;
        // No data yet, so the marker has no position on the time axis.
        assert!(frame.markers.is_empty());
    }
}
