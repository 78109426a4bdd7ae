//! Download request and result models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::convert::SaveFormat;

/// Outcome classification for a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Error,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Success => write!(f, "success"),
            DownloadStatus::Error => write!(f, "error"),
        }
    }
}

/// Options controlling what a download produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Directory that receives the snapshot and any converted splits
    pub output_dir: PathBuf,

    /// Whether to mirror the full repository tree
    pub download_all: bool,

    /// Target format for converted splits; `None` skips conversion entirely
    pub save_format: Option<SaveFormat>,

    /// Cap on rows per split; `None` keeps every row
    pub sample: Option<usize>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            download_all: true,
            save_format: None,
            sample: None,
        }
    }
}

impl DownloadOptions {
    /// Create options targeting the given output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Enable or disable the full repository snapshot
    pub fn download_all(mut self, all: bool) -> Self {
        self.download_all = all;
        self
    }

    /// Request split conversion into the given format
    pub fn save_format(mut self, format: SaveFormat) -> Self {
        self.save_format = Some(format);
        self
    }

    /// Cap each converted split at `n` rows
    pub fn sample(mut self, n: usize) -> Self {
        self.sample = Some(n);
        self
    }
}

/// Result of a dataset download operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Whether the download succeeded or failed
    pub status: DownloadStatus,

    /// Paths created on disk: the snapshot directory and/or converted split files
    pub saved_files: Vec<PathBuf>,

    /// Wall-clock duration of the whole operation in seconds
    pub time_used: f64,

    /// Error description when the status is `Error`
    pub message: Option<String>,
}

impl DownloadResult {
    /// Create a successful download result
    pub fn success(saved_files: Vec<PathBuf>, time_used: f64) -> Self {
        Self {
            status: DownloadStatus::Success,
            saved_files,
            time_used,
            message: None,
        }
    }

    /// Create a failed download result
    pub fn error(message: impl Into<String>, time_used: f64) -> Self {
        Self {
            status: DownloadStatus::Error,
            saved_files: Vec::new(),
            time_used,
            message: Some(message.into()),
        }
    }

    /// Whether the download succeeded
    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}
