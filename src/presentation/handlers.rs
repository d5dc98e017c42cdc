// HTTP request handlers
use crate::application::publish_service::{PublishError, PublishRequest};
use crate::domain::telemetry::Sample;
use crate::infrastructure::http_response::{accepts_brotli, attachment_response, json_response};
use crate::infrastructure::parquet_export::{self, EXPORT_FILE_NAME};
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Json, Response,
    },
};
use futures::stream::Stream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn checked(on: bool) -> &'static str {
    if on { "checked" } else { "" }
}

/// Dashboard page; data is fetched from the JSON endpoints. The publish form
/// starts from the configured sandbox and draft settings.
pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let refresh_ms = state.poller.interval().as_millis().to_string();
    let settings = state.publish_service.settings();
    Html(
        DASHBOARD_TEMPLATE
            .replace("{{refresh_ms}}", &refresh_ms)
            .replace("{{sandbox_checked}}", checked(settings.sandbox))
            .replace("{{draft_checked}}", checked(settings.publish_draft)),
    )
}

pub async fn get_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let dashboard = state.dashboard_service.get_dashboard().await;

    match json_response(&dashboard, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Full live series collected this session
pub async fn get_telemetry(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

#[derive(Serialize)]
pub struct SessionStatus {
    pub started_at: DateTime<Utc>,
    pub poll_interval_secs: u64,
    pub sample_count: usize,
    pub latest: Option<Sample>,
    pub last_error: Option<String>,
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SessionStatus {
        started_at: state.store.started_at(),
        poll_interval_secs: state.poller.interval().as_secs(),
        sample_count: state.store.len(),
        latest: state.store.latest(),
        last_error: state.poller.last_error(),
    })
}

/// Server-sent events, one `sample` event per appended sample
pub async fn stream_telemetry(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.poller.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(sample) => match Event::default().event("sample").json_data(&sample) {
                    Ok(event) => yield Ok::<_, Infallible>(event),
                    Err(e) => tracing::warn!("Failed to encode sample event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Live subscriber lagged, skipped {} sample(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn get_report(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard_service.load_report().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

/// Download the live series as parquet
pub async fn export_parquet(State(state): State<Arc<AppState>>) -> Response {
    let series = state.store.snapshot();

    match parquet_export::export(&series) {
        Ok(bytes) => match attachment_response(bytes, "application/octet-stream", EXPORT_FILE_NAME) {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!("Parquet export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct PublishBody {
    pub api_token: String,
    pub sandbox: Option<bool>,
    pub publish_draft: Option<bool>,
}

pub async fn publish(State(state): State<Arc<AppState>>, Json(body): Json<PublishBody>) -> Response {
    let settings = state.publish_service.settings();
    let request = PublishRequest {
        api_token: body.api_token,
        sandbox: body.sandbox.unwrap_or(settings.sandbox),
        publish_draft: body.publish_draft.unwrap_or(settings.publish_draft),
    };

    match state.publish_service.publish(request).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            tracing::error!("Publishing failed: {}", e);
            let status = match &e {
                PublishError::MissingToken => StatusCode::BAD_REQUEST,
                PublishError::Http(_) | PublishError::Status { .. } => StatusCode::BAD_GATEWAY,
                PublishError::Export(_) | PublishError::Metadata(_) | PublishError::Qr(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Most recently published record, if any
pub async fn latest_published(State(state): State<Arc<AppState>>) -> Response {
    match state.publish_service.latest() {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// QR code linking to the latest published record
pub async fn publish_qr(State(state): State<Arc<AppState>>) -> Response {
    match state.publish_service.latest_qr_svg() {
        Some(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        None => (StatusCode::NOT_FOUND, "nothing published yet").into_response(),
    }
}
