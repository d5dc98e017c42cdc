// Presentation layer - HTTP surface
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dashboard_page, export_parquet, get_dashboard, get_report, get_session, get_telemetry, health_check,
    latest_published, publish, publish_qr, stream_telemetry,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/healthz", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/session", get(get_session))
        .route("/api/telemetry", get(get_telemetry))
        .route("/api/telemetry/stream", get(stream_telemetry))
        .route("/api/report", get(get_report))
        .route("/api/publish", post(publish).get(latest_published))
        .route("/api/publish/qr.svg", get(publish_qr))
        .route("/export/battery_data.parquet", get(export_parquet))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::poller::Poller;
    use crate::application::publish_service::{
        Deposition, DepositionMetadata, PublishError, PublishRequest, PublishService, PublisherFactory,
        RecordPublisher,
    };
    use crate::application::sampler::tests::{battery, ScriptedSource};
    use crate::application::sampler::TelemetrySampler;
    use crate::application::store::TelemetryStore;
    use crate::infrastructure::config::ZenodoSettings;
    use crate::infrastructure::report_parser::ReportParser;
    use crate::infrastructure::zenodo::zenodo_publisher_factory;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;

    /// Publisher standing in for the data repository; rejects every deposition when `reject` is set.
    struct FakePublisher {
        reject: bool,
    }

    #[async_trait]
    impl RecordPublisher for FakePublisher {
        async fn create_deposition(&self, _metadata: &DepositionMetadata) -> Result<Deposition, PublishError> {
            if self.reject {
                return Err(PublishError::Status {
                    step: "create deposition",
                    status: 401,
                    body: "invalid token".to_string(),
                });
            }
            Ok(Deposition {
                id: 9,
                html_url: "https://sandbox.zenodo.org/deposit/9".to_string(),
            })
        }

        async fn upload_file(
            &self,
            _deposition: &Deposition,
            _file_name: &str,
            _content: Bytes,
            _mime: &str,
        ) -> Result<(), PublishError> {
            Ok(())
        }

        async fn publish(&self, _deposition: &Deposition) -> Result<Option<String>, PublishError> {
            Ok(Some("https://sandbox.zenodo.org/records/9".to_string()))
        }
    }

    fn fake_factory(reject: bool) -> PublisherFactory {
        Arc::new(move |_: &PublishRequest| Arc::new(FakePublisher { reject }) as Arc<dyn RecordPublisher>)
    }

    async fn serve() -> (String, Arc<AppState>, tempfile::TempDir) {
        serve_with(zenodo_publisher_factory()).await
    }

    async fn serve_with(factory: PublisherFactory) -> (String, Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TelemetryStore::new());
        let source = ScriptedSource::new(vec![Ok(vec![battery(12_000)])]);
        let poller = Arc::new(Poller::new(
            TelemetrySampler::new(Arc::new(source)),
            store.clone(),
            Duration::from_secs(30),
        ));
        let state = Arc::new(AppState {
            store: store.clone(),
            poller: poller.clone(),
            dashboard_service: DashboardService::new(
                store.clone(),
                poller,
                ReportParser::default(),
                dir.path().join("battery-report.html"),
            ),
            publish_service: Arc::new(PublishService::new(store, ZenodoSettings::default(), factory)),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state, dir)
    }

    #[tokio::test]
    async fn test_live_data_served_without_report() {
        let (base, state, _dir) = serve().await;
        state.poller.poll_once().await.unwrap();

        let health = reqwest::get(format!("{}/healthz", base)).await.unwrap().text().await.unwrap();
        assert_eq!(health, "ok");

        let telemetry: serde_json::Value = reqwest::get(format!("{}/api/telemetry", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(telemetry.as_array().unwrap().len(), 1);
        assert_eq!(telemetry[0]["voltage_v"], 12.0);

        let session: serde_json::Value = reqwest::get(format!("{}/api/session", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session["sample_count"], 1);
        assert_eq!(session["poll_interval_secs"], 30);
        assert!(session["last_error"].is_null());

        let report = reqwest::get(format!("{}/api/report", base)).await.unwrap();
        assert_eq!(report.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

        let dashboard: serde_json::Value = reqwest::get(format!("{}/api/dashboard", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(dashboard["sample_count"], 1);
        assert_eq!(dashboard["metadata"][0]["value"], "Not available");
    }

    #[tokio::test]
    async fn test_parquet_download() {
        let (base, state, _dir) = serve().await;
        state.poller.poll_once().await.unwrap();

        let response = reqwest::get(format!("{}/export/battery_data.parquet", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.bytes().await.unwrap();

        assert!(body.starts_with(b"PAR1"));
        assert!(body.ends_with(b"PAR1"));
    }

    #[tokio::test]
    async fn test_publish_rejects_empty_token_and_qr_is_absent() {
        let (base, _state, _dir) = serve().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/publish", base))
            .json(&serde_json::json!({ "api_token": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let qr = reqwest::get(format!("{}/api/publish/qr.svg", base)).await.unwrap();
        assert_eq!(qr.status(), reqwest::StatusCode::NOT_FOUND);

        let latest = reqwest::get(format!("{}/api/publish", base)).await.unwrap();
        assert_eq!(latest.status(), reqwest::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_page_reflects_publish_defaults() {
        let (base, _state, _dir) = serve().await;

        let page = reqwest::get(format!("{}/", base)).await.unwrap().text().await.unwrap();

        assert!(page.contains(r#"<input type="checkbox" name="sandbox" checked>"#));
        assert!(page.contains(r#"<input type="checkbox" name="publish_draft" checked>"#));
        assert!(page.contains("const REFRESH_MS = 30000;"));
        assert!(!page.contains("{{"));
    }

    #[tokio::test]
    async fn test_stream_emits_sample_events() {
        let (base, state, _dir) = serve().await;
        let mut response = reqwest::get(format!("{}/api/telemetry/stream", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        state.poller.poll_once().await.unwrap();

        let mut received = String::new();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !received.contains("data:") {
                let chunk = response.chunk().await.unwrap().unwrap();
                received.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .unwrap();

        assert!(received.contains("event: sample"));
        assert!(received.contains(r#""voltage_v":12.0"#));
    }

    #[tokio::test]
    async fn test_publish_returns_record_over_http() {
        let (base, state, _dir) = serve_with(fake_factory(false)).await;
        state.poller.poll_once().await.unwrap();
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/publish", base))
            .json(&serde_json::json!({ "api_token": "token", "publish_draft": false }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let record: serde_json::Value = response.json().await.unwrap();
        assert_eq!(record["record_url"], "https://sandbox.zenodo.org/records/9");
        assert_eq!(record["published"], true);

        let latest: serde_json::Value = reqwest::get(format!("{}/api/publish", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(latest, record);

        let qr = reqwest::get(format!("{}/api/publish/qr.svg", base)).await.unwrap();
        assert_eq!(qr.status(), reqwest::StatusCode::OK);
        assert_eq!(qr.headers()["content-type"], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_rejected_deposition_is_bad_gateway() {
        let (base, _state, _dir) = serve_with(fake_factory(true)).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/publish", base))
            .json(&serde_json::json!({ "api_token": "token" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        assert!(response.text().await.unwrap().contains("401"));
    }
}
