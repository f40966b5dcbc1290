//! HTTP client for the annotation store.

use std::time::Duration;

use async_trait::async_trait;
use fbg_model::{AnnotationRecord, NoticeKind, Notices};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::{Result, StoreError};
use crate::instruction::{insert_statement, validate_table};
use crate::record::normalize_items;
use crate::store::AnnotationStore;

/// User agent string for store requests.
const USER_AGENT_VALUE: &str = concat!("feedback-grid/", env!("CARGO_PKG_VERSION"));

/// Body fragments that identify a uniqueness violation on append.
const CONFLICT_MARKERS: [&str; 4] = [
    "duplicate key",
    "unique constraint",
    "uniqueness violation",
    "already exists",
];

/// Connection settings for [`HttpAnnotationStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL, e.g. `https://store.example.com/api`.
    pub base_url: String,
    /// Path of the read endpoint.
    pub fetch_path: String,
    /// Path of the write endpoint.
    pub append_path: String,
    /// Access token sent as the `token` query parameter.
    pub token: Option<String>,
    /// Table the annotation log lives in.
    pub table: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            fetch_path: "/annotations".to_string(),
            append_path: "/annotations/append".to_string(),
            token: None,
            table: "annotations".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Check the settings without making a request.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| StoreError::Config(format!("base_url '{}': {e}", self.base_url)))?;
        validate_table(&self.table)?;
        if self.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut pairs: Vec<(&str, &str)> = params.to_vec();
        if let Some(token) = &self.token {
            pairs.push(("token", token));
        }
        Url::parse_with_params(&format!("{base}/{path}"), &pairs)
            .map_err(|e| StoreError::Config(format!("endpoint '{path}': {e}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    query: String,
    dataset_id: &'a str,
}

/// Annotation store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnnotationStore {
    client: reqwest::Client,
    config: StoreConfig,
    notices: Notices,
}

impl HttpAnnotationStore {
    /// Creates a client for the configured store.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            notices: Notices::log_only(),
        })
    }

    /// Report dropped records through `notices`.
    #[must_use]
    pub fn with_notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    /// Store settings.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl AnnotationStore for HttpAnnotationStore {
    async fn fetch_all(&self, dataset_id: &str) -> Result<Vec<AnnotationRecord>> {
        let url = self
            .config
            .endpoint(&self.config.fetch_path, &[("datasetId", dataset_id)])?;
        tracing::debug!("Fetching annotations from {}", url.path());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_records(&body, dataset_id, &self.notices)
    }

    async fn append(&self, record: &AnnotationRecord) -> Result<()> {
        let url = self.config.endpoint(&self.config.append_path, &[])?;
        let body = AppendBody {
            query: insert_statement(&self.config.table, record)?,
            dataset_id: &record.dataset_id,
        };
        tracing::debug!("Appending {} v{}", record.key, record.version);

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if is_conflict(status, &text) {
            return Err(StoreError::VersionConflict {
                key: record.key.clone(),
                version: record.version,
            });
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }
}

/// Whether an append response reports a taken `(dataset, key, version)`.
fn is_conflict(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::CONFLICT {
        return true;
    }
    let lower = body.to_ascii_lowercase();
    CONFLICT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Decode a fetch response body.
///
/// Unrecognized shapes are an error; individual unusable items are dropped
/// and counted.
pub fn decode_records(
    body: &str,
    dataset_id: &str,
    notices: &Notices,
) -> Result<Vec<AnnotationRecord>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let envelope = Envelope::classify(value);
    let shape = envelope.shape();
    let items = match envelope {
        Envelope::Unrecognized(description) => {
            return Err(StoreError::MalformedResponse(description));
        }
        known => known.into_items().unwrap_or_default(),
    };

    let normalized = normalize_items(items, dataset_id);
    tracing::debug!(
        "Decoded {} records ({}) for {}",
        normalized.records.len(),
        shape,
        dataset_id
    );
    if normalized.dropped > 0 {
        notices.report(
            NoticeKind::MalformedResponse,
            format!(
                "dropped {} unusable annotation records for {}",
                normalized.dropped, dataset_id
            ),
        );
    }
    Ok(normalized.records)
}
