// Main entry point - Dependency injection and server setup
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use food_computer_dashboard::application::chart_service::ChartService;
use food_computer_dashboard::application::clock::SystemClock;
use food_computer_dashboard::application::sync_service::SyncService;
use food_computer_dashboard::domain::chart::{Action, ChartModel};
use food_computer_dashboard::domain::series::SeriesView;
use food_computer_dashboard::infrastructure::config::{load_chart_config, load_dashboard_config};
use food_computer_dashboard::infrastructure::couch_repository::CouchRepository;
use food_computer_dashboard::presentation::app_state::AppState;
use food_computer_dashboard::presentation::handlers::{
    drop_marker, get_chart, health_check, move_xhair, resize, scrubber,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dashboard = load_dashboard_config()?;
    let chart = load_chart_config()?;

    let repository = Arc::new(CouchRepository::new(
        dashboard.database.url.clone(),
        dashboard.database.name.clone(),
    ));

    let series = chart.series()?;
    let model = ChartModel::new(
        SeriesView::new(series),
        chart.settings.width,
        chart.settings.height,
    );
    let chart_service = Arc::new(ChartService::new(
        model,
        chart.chart_settings(),
        repository.clone(),
        Arc::new(SystemClock),
    ));

    // Start the self-rescheduling tick that keeps idle lines extended to now
    let effect = chart_service.dispatch(Action::Tick).await;
    chart_service.spawn_effect(effect);

    let sync_service = Arc::new(SyncService::new(
        repository,
        chart_service.clone(),
        dashboard.database.remote.clone(),
        dashboard.database.poll_interval(),
    ));
    tokio::spawn(sync_service.run());

    let state = Arc::new(AppState { chart_service });

    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/chart", get(get_chart))
        .route("/chart/resize", post(resize))
        .route("/chart/xhair", post(move_xhair))
        .route("/chart/markers", post(drop_marker))
        .route("/chart/scrubber", post(scrubber))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = dashboard.server.bind.parse()?;
    tracing::info!(
        "Starting food-computer dashboard on {} ({} variables)",
        addr,
        chart.variables.len()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
