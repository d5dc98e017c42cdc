// Zenodo deposition API client
use crate::application::publish_service::{
    Deposition, DepositionMetadata, PublishError, PublishRequest, RecordPublisher,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SANDBOX_DEPOSITIONS_URL: &str = "https://sandbox.zenodo.org/api/deposit/depositions";
pub const DEPOSITIONS_URL: &str = "https://zenodo.org/api/deposit/depositions";

#[derive(Debug, Clone)]
pub struct ZenodoClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Serialize)]
struct CreateDepositionBody<'a> {
    metadata: &'a DepositionMetadata,
}

#[derive(Debug, Deserialize)]
struct DepositionResponse {
    id: u64,
    links: DepositionLinks,
}

#[derive(Debug, Deserialize)]
struct DepositionLinks {
    html: String,
}

impl ZenodoClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn for_request(client: reqwest::Client, request: &PublishRequest) -> Self {
        let base_url = if request.sandbox {
            SANDBOX_DEPOSITIONS_URL
        } else {
            DEPOSITIONS_URL
        };
        Self::new(client, base_url, request.api_token.clone())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn expect_status(
        response: reqwest::Response,
        expected: StatusCode,
        step: &'static str,
    ) -> Result<reqwest::Response, PublishError> {
        if response.status() == expected {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Status { step, status, body })
    }
}

/// Factory handing out a fresh client per publish request, sharing one HTTP pool.
pub fn zenodo_publisher_factory() -> crate::application::publish_service::PublisherFactory {
    let http = reqwest::Client::new();
    Arc::new(move |request: &PublishRequest| {
        Arc::new(ZenodoClient::for_request(http.clone(), request)) as Arc<dyn RecordPublisher>
    })
}

#[async_trait]
impl RecordPublisher for ZenodoClient {
    async fn create_deposition(&self, metadata: &DepositionMetadata) -> Result<Deposition, PublishError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", self.bearer())
            .json(&CreateDepositionBody { metadata })
            .send()
            .await?;
        let response = Self::expect_status(response, StatusCode::CREATED, "creating deposition").await?;

        let body = response.json::<DepositionResponse>().await?;
        Ok(Deposition {
            id: body.id,
            html_url: body.links.html,
        })
    }

    async fn upload_file(
        &self,
        deposition: &Deposition,
        file_name: &str,
        content: Bytes,
        mime: &str,
    ) -> Result<(), PublishError> {
        let url = format!("{}/{}/files", self.base_url, deposition.id);
        let part = Part::bytes(content.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;
        Self::expect_status(response, StatusCode::CREATED, "uploading file").await?;

        tracing::debug!("Uploaded {} to deposition {}", file_name, deposition.id);
        Ok(())
    }

    async fn publish(&self, deposition: &Deposition) -> Result<Option<String>, PublishError> {
        let url = format!("{}/{}/actions/publish", self.base_url, deposition.id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            tracing::warn!("Publish request returned status {}", response.status());
            return Ok(None);
        }
        let body = response.json::<DepositionResponse>().await?;
        Ok(Some(body.links.html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeZenodo {
        created: Mutex<Vec<Value>>,
        uploads: Mutex<Vec<u64>>,
        auth: Mutex<Vec<String>>,
    }

    async fn create(
        State(fake): State<Arc<FakeZenodo>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        fake.auth.lock().unwrap().push(auth);
        fake.created.lock().unwrap().push(body);
        (
            AxumStatus::CREATED,
            Json(json!({ "id": 7, "links": { "html": "https://sandbox.zenodo.org/deposit/7" } })),
        )
    }

    async fn upload(State(fake): State<Arc<FakeZenodo>>, Path(id): Path<u64>) -> AxumStatus {
        fake.uploads.lock().unwrap().push(id);
        AxumStatus::CREATED
    }

    async fn publish_rejected() -> AxumStatus {
        AxumStatus::BAD_REQUEST
    }

    async fn serve(fake: Arc<FakeZenodo>) -> String {
        let router = Router::new()
            .route("/depositions", post(create))
            .route("/depositions/:id/files", post(upload))
            .route("/depositions/:id/actions/publish", post(publish_rejected))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/depositions", addr)
    }

    #[tokio::test]
    async fn test_create_upload_and_rejected_publish() {
        let fake = Arc::new(FakeZenodo::default());
        let base_url = serve(fake.clone()).await;
        let client = ZenodoClient::new(reqwest::Client::new(), base_url, "secret");
        let settings = crate::infrastructure::config::ZenodoSettings::default();

        let deposition = client
            .create_deposition(&DepositionMetadata::from_settings(&settings))
            .await
            .unwrap();
        assert_eq!(deposition.id, 7);
        assert_eq!(deposition.html_url, "https://sandbox.zenodo.org/deposit/7");

        client
            .upload_file(&deposition, "battery_data.parquet", Bytes::from_static(b"PAR1"), "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(*fake.uploads.lock().unwrap(), vec![7]);

        assert_eq!(client.publish(&deposition).await.unwrap(), None);

        assert_eq!(fake.auth.lock().unwrap()[0], "Bearer secret");
        let created = fake.created.lock().unwrap();
        assert_eq!(created[0]["metadata"]["upload_type"], "dataset");
        assert_eq!(created[0]["metadata"]["access_right"], "open");
        assert_eq!(created[0]["metadata"]["license"], "CC-BY-4.0");
    }

    #[tokio::test]
    async fn test_unexpected_status_is_an_error() {
        let router = Router::new().route("/depositions", post(|| async { AxumStatus::UNAUTHORIZED }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = ZenodoClient::new(reqwest::Client::new(), format!("http://{}/depositions", addr), "bad");
        let err = client
            .create_deposition(&DepositionMetadata::from_settings(&Default::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Status { status: 401, .. }));
    }

    #[test]
    fn test_request_selects_endpoint() {
        let request = PublishRequest {
            api_token: "t".to_string(),
            sandbox: false,
            publish_draft: true,
        };
        let client = ZenodoClient::for_request(reqwest::Client::new(), &request);
        assert_eq!(client.base_url, DEPOSITIONS_URL);
    }
}
