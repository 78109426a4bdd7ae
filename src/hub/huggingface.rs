//! Hugging Face Hub client implementation.
//!
//! Talks to the Hub REST API for dataset search, repository listings, and
//! file retrieval. API documentation: <https://huggingface.co/docs/hub/api>

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::hub::{DatasetHub, HubError, RepoFile};
use crate::models::DatasetSummary;
use crate::utils::HttpClient;

/// Public hub endpoint
pub const HF_HUB_BASE: &str = "https://huggingface.co";

/// Hugging Face Hub REST client
///
/// Public datasets need no authentication; a token from the `HF_TOKEN`
/// environment variable (or [`HfHub::token`]) is attached as a bearer
/// header for gated ones.
#[derive(Debug, Clone)]
pub struct HfHub {
    client: Arc<HttpClient>,
    endpoint: String,
    token: Option<String>,
}

impl HfHub {
    /// Create a client against the public hub
    pub fn new() -> Result<Self, HubError> {
        Self::with_endpoint(HF_HUB_BASE)
    }

    /// Create a client against a custom endpoint such as a mirror
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, HubError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();

        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            endpoint,
            token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    /// Set the access token used for gated datasets
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl DatasetHub for HfHub {
    fn id(&self) -> &str {
        "huggingface"
    }

    fn name(&self) -> &str {
        "Hugging Face Hub"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<DatasetSummary>, HubError> {
        let url = format!(
            "{}/api/datasets?search={}&limit={}&full=false",
            self.endpoint,
            urlencoding::encode(keyword),
            limit
        );

        let response = self.request(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(match status.as_u16() {
                429 => HubError::RateLimited,
                code => {
                    let text = response.text().await.unwrap_or_default();
                    HubError::Api {
                        status: code,
                        message: text,
                    }
                }
            });
        }

        let datasets: Vec<HubDataset> = response
            .json()
            .await
            .map_err(|e| HubError::Parse(format!("Failed to parse hub search response: {}", e)))?;

        Ok(datasets
            .into_iter()
            .map(HubDataset::into_summary)
            .collect())
    }

    async fn list_files(&self, dataset_id: &str) -> Result<Vec<RepoFile>, HubError> {
        let url = format!(
            "{}/api/datasets/{}/tree/main?recursive=true",
            self.endpoint, dataset_id
        );

        let response = self.request(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(match status.as_u16() {
                404 => HubError::NotFound(format!(
                    "dataset '{}' not found on the hub",
                    dataset_id
                )),
                429 => HubError::RateLimited,
                code => {
                    let text = response.text().await.unwrap_or_default();
                    HubError::Api {
                        status: code,
                        message: text,
                    }
                }
            });
        }

        response
            .json()
            .await
            .map_err(|e| HubError::Parse(format!("Failed to parse repository tree: {}", e)))
    }

    async fn fetch_file(&self, dataset_id: &str, path: &str, dest: &Path) -> Result<u64, HubError> {
        let bytes = self.fetch_bytes(dataset_id, path).await?;
        let len = bytes.len() as u64;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;

        Ok(len)
    }

    async fn fetch_bytes(&self, dataset_id: &str, path: &str) -> Result<Bytes, HubError> {
        let url = format!(
            "{}/datasets/{}/resolve/main/{}",
            self.endpoint, dataset_id, path
        );

        let response = self.request(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(match status.as_u16() {
                404 => HubError::NotFound(format!(
                    "file '{}' not found in dataset '{}'",
                    path, dataset_id
                )),
                429 => HubError::RateLimited,
                code => {
                    let text = response.text().await.unwrap_or_default();
                    HubError::Api {
                        status: code,
                        message: text,
                    }
                }
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Hub dataset listing entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HubDataset {
    id: String,
    #[serde(default)]
    downloads: Option<u64>,
    #[serde(default)]
    likes: Option<u64>,
    #[serde(default)]
    last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
}

impl HubDataset {
    fn into_summary(self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            downloads: self.downloads,
            likes: self.likes,
            last_modified: self.last_modified,
            tags: self.tags,
        }
    }
}
