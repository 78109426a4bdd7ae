//! Mock hub for testing purposes.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::hub::{DatasetHub, HubError, RepoFile};
use crate::models::DatasetSummary;

/// A mock hub that serves predefined datasets, trees, and file contents.
///
/// Failures can be scripted per call with [`MockHub::fail_next`] or made
/// permanent with [`MockHub::always_fail`]; scripted failures are consumed
/// before any configured data is served.
#[derive(Debug, Default)]
pub struct MockHub {
    datasets: Vec<DatasetSummary>,
    files: HashMap<String, Vec<RepoFile>>,
    blobs: HashMap<(String, String), Bytes>,
    fail_queue: Mutex<Vec<HubError>>,
    always_fail: Mutex<Option<String>>,
    search_requests: Mutex<Vec<(String, usize)>>,
}

impl MockHub {
    /// Create an empty mock hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset to the search listing.
    pub fn with_dataset(mut self, summary: DatasetSummary) -> Self {
        self.datasets.push(summary);
        self
    }

    /// Add a file with contents to a dataset repository.
    pub fn with_file(mut self, dataset_id: &str, path: &str, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();

        self.files
            .entry(dataset_id.to_string())
            .or_default()
            .push(RepoFile::file(path, bytes.len() as u64));
        self.blobs
            .insert((dataset_id.to_string(), path.to_string()), bytes);
        self
    }

    /// Add a raw tree entry without contents, e.g. a directory.
    pub fn with_entry(mut self, dataset_id: &str, entry: RepoFile) -> Self {
        self.files
            .entry(dataset_id.to_string())
            .or_default()
            .push(entry);
        self
    }

    /// Script a failure for the next hub call.
    pub fn fail_next(&self, error: HubError) {
        self.fail_queue.lock().unwrap().push(error);
    }

    /// Make every hub call fail with a transient network error.
    pub fn always_fail(&self, message: impl Into<String>) {
        *self.always_fail.lock().unwrap() = Some(message.into());
    }

    /// Keywords and limits of the search calls received so far.
    pub fn search_requests(&self) -> Vec<(String, usize)> {
        self.search_requests.lock().unwrap().clone()
    }

    fn next_failure(&self) -> Option<HubError> {
        if let Some(message) = self.always_fail.lock().unwrap().as_ref() {
            return Some(HubError::Network(message.clone()));
        }

        let mut queue = self.fail_queue.lock().unwrap();
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl DatasetHub for MockHub {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Hub"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<DatasetSummary>, HubError> {
        self.search_requests
            .lock()
            .unwrap()
            .push((keyword.to_string(), limit));

        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        Ok(self.datasets.iter().take(limit).cloned().collect())
    }

    async fn list_files(&self, dataset_id: &str) -> Result<Vec<RepoFile>, HubError> {
        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        self.files
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("dataset '{}' not found", dataset_id)))
    }

    async fn fetch_file(&self, dataset_id: &str, path: &str, dest: &Path) -> Result<u64, HubError> {
        let bytes = self.fetch_bytes(dataset_id, path).await?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;

        Ok(bytes.len() as u64)
    }

    async fn fetch_bytes(&self, dataset_id: &str, path: &str) -> Result<Bytes, HubError> {
        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        self.blobs
            .get(&(dataset_id.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| {
                HubError::NotFound(format!(
                    "file '{}' not found in dataset '{}'",
                    path, dataset_id
                ))
            })
    }
}
