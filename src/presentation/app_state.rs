// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::poller::Poller;
use crate::application::publish_service::PublishService;
use crate::application::store::TelemetryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    pub poller: Arc<Poller>,
    pub dashboard_service: DashboardService,
    pub publish_service: Arc<PublishService>,
}
