//! Core data models for datasets and download operations.

mod dataset;
mod download;

pub use dataset::DatasetSummary;
pub use download::{DownloadOptions, DownloadResult, DownloadStatus};
