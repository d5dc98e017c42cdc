// Publish service - Uploads the export and its metadata as a public dataset record
use crate::application::store::TelemetryStore;
use crate::infrastructure::config::{Creator, ZenodoSettings};
use crate::infrastructure::jsonld::{dataset_metadata, METADATA_FILE_NAME};
use crate::infrastructure::parquet_export::{self, ExportError, EXPORT_FILE_NAME};
use crate::infrastructure::qr::record_qr_svg;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("an API token is required")]
    MissingToken,
    #[error("request to the data repository failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{step} failed with status {status}: {body}")]
    Status {
        step: &'static str,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to encode dataset metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("failed to render QR code: {0}")]
    Qr(String),
}

/// Deposition created on the remote repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposition {
    pub id: u64,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositionMetadata {
    pub title: String,
    pub upload_type: &'static str,
    pub description: String,
    pub creators: Vec<DepositionCreator>,
    pub keywords: Vec<String>,
    pub notes: String,
    pub access_right: &'static str,
    pub license: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositionCreator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl From<&Creator> for DepositionCreator {
    fn from(creator: &Creator) -> Self {
        Self {
            name: creator.name.clone(),
            orcid: creator.orcid.clone(),
        }
    }
}

impl DepositionMetadata {
    pub fn from_settings(settings: &ZenodoSettings) -> Self {
        Self {
            title: settings.title.clone(),
            upload_type: "dataset",
            description: settings.description.clone(),
            creators: settings.creators.iter().map(DepositionCreator::from).collect(),
            keywords: settings.keywords.clone(),
            notes: "Battery logging data capturing voltage, remaining capacity, discharge rate, and charge rate over time.".to_string(),
            access_right: "open",
            license: settings.license.clone(),
        }
    }
}

/// Port for the remote data repository.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn create_deposition(&self, metadata: &DepositionMetadata) -> Result<Deposition, PublishError>;

    async fn upload_file(
        &self,
        deposition: &Deposition,
        file_name: &str,
        content: Bytes,
        mime: &str,
    ) -> Result<(), PublishError>;

    /// Publish the deposition. `Ok(None)` when the repository declined to publish.
    async fn publish(&self, deposition: &Deposition) -> Result<Option<String>, PublishError>;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublishedRecord {
    pub record_url: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub api_token: String,
    pub sandbox: bool,
    pub publish_draft: bool,
}

/// Builds a publisher for one request's token and target.
pub type PublisherFactory = Arc<dyn Fn(&PublishRequest) -> Arc<dyn RecordPublisher> + Send + Sync>;

pub struct PublishService {
    store: Arc<TelemetryStore>,
    settings: ZenodoSettings,
    publisher_for: PublisherFactory,
    latest: RwLock<Option<(PublishedRecord, String)>>,
}

impl PublishService {
    pub fn new(store: Arc<TelemetryStore>, settings: ZenodoSettings, publisher_for: PublisherFactory) -> Self {
        Self {
            store,
            settings,
            publisher_for,
            latest: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &ZenodoSettings {
        &self.settings
    }

    /// Export the current series, create a deposition, upload the parquet file and
    /// its JSON-LD description, then publish unless a draft was requested.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishedRecord, PublishError> {
        if request.api_token.trim().is_empty() {
            return Err(PublishError::MissingToken);
        }

        let parquet = parquet_export::export(&self.store.snapshot())?;
        let publisher = (self.publisher_for)(&request);

        let deposition = publisher
            .create_deposition(&DepositionMetadata::from_settings(&self.settings))
            .await?;
        tracing::info!("Created deposition {} at {}", deposition.id, deposition.html_url);

        let metadata = dataset_metadata(&self.settings, &deposition.html_url, Utc::now().date_naive());
        let metadata = Bytes::from(serde_json::to_vec_pretty(&metadata)?);

        publisher
            .upload_file(&deposition, EXPORT_FILE_NAME, parquet, "application/octet-stream")
            .await?;
        publisher
            .upload_file(&deposition, METADATA_FILE_NAME, metadata, "application/ld+json")
            .await?;

        let record = if request.publish_draft {
            tracing::info!("Draft record created (not published)");
            PublishedRecord {
                record_url: deposition.html_url.clone(),
                published: false,
            }
        } else {
            match publisher.publish(&deposition).await? {
                Some(url) => PublishedRecord {
                    record_url: url,
                    published: true,
                },
                None => {
                    tracing::warn!("Publishing deposition {} failed, keeping the draft", deposition.id);
                    PublishedRecord {
                        record_url: deposition.html_url.clone(),
                        published: false,
                    }
                }
            }
        };

        let qr = record_qr_svg(&record.record_url).map_err(|e| PublishError::Qr(e.to_string()))?;
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some((record.clone(), qr));

        Ok(record)
    }

    pub fn latest(&self) -> Option<PublishedRecord> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(record, _)| record.clone())
    }

    /// QR code of the most recently published record, as SVG.
    pub fn latest_qr_svg(&self) -> Option<String> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, qr)| qr.clone())
    }
}
