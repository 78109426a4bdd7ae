//! Dataset metadata models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of a dataset repository as listed by the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Repository identifier, e.g. `squad` or `username/dataset-name`
    pub id: String,

    /// Total download count, when the hub reports it
    pub downloads: Option<u64>,

    /// Like count, when the hub reports it
    pub likes: Option<u64>,

    /// Timestamp of the last repository update
    pub last_modified: Option<DateTime<Utc>>,

    /// Hub tags such as task categories and languages
    pub tags: Vec<String>,
}

impl DatasetSummary {
    /// Create a summary with only the identifier set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            downloads: None,
            likes: None,
            last_modified: None,
            tags: Vec::new(),
        }
    }

    /// Set the download count
    pub fn downloads(mut self, downloads: u64) -> Self {
        self.downloads = Some(downloads);
        self
    }

    /// Set the like count
    pub fn likes(mut self, likes: u64) -> Self {
        self.likes = Some(likes);
        self
    }

    /// Set the last-modified timestamp
    pub fn last_modified(mut self, when: DateTime<Utc>) -> Self {
        self.last_modified = Some(when);
        self
    }

    /// Set the hub tags
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_summary_builder() {
        let summary = DatasetSummary::new("username/dataset")
            .downloads(1200)
            .likes(34)
            .tags(vec!["text-classification".to_string()]);

        assert_eq!(summary.id, "username/dataset");
        assert_eq!(summary.downloads, Some(1200));
        assert_eq!(summary.likes, Some(34));
        assert!(summary.last_modified.is_none());
        assert_eq!(summary.tags.len(), 1);
    }

    #[test]
    fn test_dataset_summary_serializes_roundtrip() {
        let summary = DatasetSummary::new("squad").downloads(5);
        let json = serde_json::to_string(&summary).unwrap();
        let back: DatasetSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
