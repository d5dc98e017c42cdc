// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::poller::Poller;
use crate::application::publish_service::PublishService;
use crate::application::sampler::TelemetrySampler;
use crate::application::store::TelemetryStore;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::open_battery_source;
use crate::infrastructure::report_parser::ReportParser;
use crate::infrastructure::zenodo::zenodo_publisher_factory;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("battery_dashboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let cfg = load_app_config()?;

    // Connect to battery instrumentation (infrastructure layer); without it there is nothing to sample
    let source = open_battery_source(&cfg.telemetry)?;
    info!("Sampling battery status via {} every {}s", source.name(), cfg.telemetry.poll_interval_secs);

    // Create services (application layer)
    let store = Arc::new(TelemetryStore::new());
    let poller = Arc::new(Poller::new(
        TelemetrySampler::new(source),
        store.clone(),
        Duration::from_secs(cfg.telemetry.poll_interval_secs.max(1)),
    ));
    let _sampling = poller.clone().start();

    let dashboard_service = DashboardService::new(
        store.clone(),
        poller.clone(),
        ReportParser::new(cfg.report.history_table_index),
        cfg.report.path.clone(),
    );
    let publish_service = Arc::new(PublishService::new(
        store.clone(),
        cfg.zenodo.clone(),
        zenodo_publisher_factory(),
    ));

    // Create application state
    let state = Arc::new(AppState {
        store,
        poller,
        dashboard_service,
        publish_service,
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&cfg.server.bind).await?;
    info!("Starting battery-dashboard service on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;

    Ok(())
}
