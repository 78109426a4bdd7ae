//! Dataset hub clients.
//!
//! This module defines the [`DatasetHub`] trait that hub backends implement.
//! The real backend is [`HfHub`], which talks to the Hugging Face Hub REST
//! API; [`MockHub`] is an in-memory backend for tests and offline
//! experiments. Everything above this seam (search, snapshot download,
//! split conversion) is written against the trait, not a concrete client.

mod huggingface;
pub mod mock;

pub use huggingface::{HfHub, HF_HUB_BASE};
pub use mock::MockHub;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::DatasetSummary;

/// A remote registry hosting searchable dataset repositories.
///
/// Implementations are thin wire adapters: they perform one request per
/// call and classify failures into [`HubError`]. Retry and timeout policy
/// live in the callers, not here.
#[async_trait]
pub trait DatasetHub: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this hub (e.g. "huggingface")
    fn id(&self) -> &str;

    /// Human-readable name of this hub
    fn name(&self) -> &str;

    /// Search for datasets matching a keyword, up to `limit` results.
    ///
    /// Ordering is the hub's ranking and is passed through untouched.
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<DatasetSummary>, HubError>;

    /// List every entry in a dataset repository's file tree.
    async fn list_files(&self, dataset_id: &str) -> Result<Vec<RepoFile>, HubError>;

    /// Download one repository file to `dest`, returning the bytes written.
    async fn fetch_file(&self, dataset_id: &str, path: &str, dest: &Path)
        -> Result<u64, HubError>;

    /// Download one repository file into memory.
    async fn fetch_bytes(&self, dataset_id: &str, path: &str) -> Result<Bytes, HubError>;
}

/// One entry in a dataset repository's file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    /// Path relative to the repository root
    pub path: String,

    /// File size in bytes (0 for directories)
    #[serde(default)]
    pub size: u64,

    /// Whether this entry is a file or a directory
    #[serde(rename = "type")]
    pub kind: FileKind,
}

impl RepoFile {
    /// Create a file entry (test and mock construction helper).
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            kind: FileKind::File,
        }
    }

    /// Whether this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }
}

/// Kind of a repository tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
    #[serde(other)]
    Unknown,
}

/// Errors that can occur when interacting with a hub
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The call exceeded its wall-clock deadline
    #[error("Operation timed out")]
    Timeout,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Non-success response from the hub API
    #[error("Hub API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Dataset or file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Split decoding or format serialization failed
    #[error("Conversion error: {0}")]
    Convert(String),

    /// A search failed after retries were exhausted
    #[error("Search for \"{keyword}\" failed: {source}")]
    Search {
        keyword: String,
        #[source]
        source: Box<HubError>,
    },

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl HubError {
    /// Whether retrying the operation can plausibly succeed.
    ///
    /// Transport failures, deadline overruns, throttling, and server-side
    /// errors are worth another attempt. Everything else (bad input, missing
    /// resources, decode failures, local IO) fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            HubError::Network(_) | HubError::Timeout | HubError::RateLimited => true,
            HubError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return HubError::Timeout;
        }
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return HubError::RateLimited;
            }
            return HubError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        HubError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Parse(format!("JSON: {}", err))
    }
}

impl From<arrow::error::ArrowError> for HubError {
    fn from(err: arrow::error::ArrowError) -> Self {
        HubError::Convert(format!("Arrow: {}", err))
    }
}

impl From<parquet::errors::ParquetError> for HubError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        HubError::Convert(format!("Parquet: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(HubError::Network("connection refused".to_string()).is_retryable());
        assert!(HubError::Timeout.is_retryable());
        assert!(HubError::RateLimited.is_retryable());
        assert!(HubError::Api {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());

        assert!(!HubError::Api {
            status: 400,
            message: "bad request".to_string()
        }
        .is_retryable());
        assert!(!HubError::Parse("invalid json".to_string()).is_retryable());
        assert!(!HubError::NotFound("org/missing".to_string()).is_retryable());
        assert!(!HubError::InvalidRequest("empty id".to_string()).is_retryable());
        assert!(!HubError::Convert("schema mismatch".to_string()).is_retryable());
    }

    #[test]
    fn test_search_error_carries_cause() {
        let err = HubError::Search {
            keyword: "imdb".to_string(),
            source: Box::new(HubError::Timeout),
        };
        let msg = err.to_string();
        assert!(msg.contains("imdb"));
        assert!(msg.contains("timed out"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_file_kind_parses_tree_entries() {
        let entry: RepoFile =
            serde_json::from_str(r#"{"type":"file","size":42,"path":"data/train.parquet"}"#)
                .expect("parse tree entry");
        assert!(entry.is_file());
        assert_eq!(entry.size, 42);

        let dir: RepoFile = serde_json::from_str(r#"{"type":"directory","path":"data"}"#)
            .expect("parse directory entry");
        assert!(!dir.is_file());
        assert_eq!(dir.size, 0);
    }
}
