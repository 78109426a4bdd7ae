//! # hubfetch
//!
//! Search, download and convert machine-learning datasets from the
//! Hugging Face Hub.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (DatasetSummary, DownloadResult, etc.)
//! - [`hub`]: Hub access behind the [`hub::DatasetHub`] trait, with a real
//!   client and an in-memory mock
//! - [`search`]: Keyword search with over-fetching and substring filtering
//! - [`download`]: Repository snapshots and split conversion
//! - [`convert`]: Parquet split loading, sampling, and format writers
//! - [`session`]: The guided interactive search-and-download flow
//! - [`utils`]: HTTP client, retries, and the bounded worker pool
//! - [`config`]: Configuration management

pub mod config;
pub mod convert;
pub mod download;
pub mod hub;
pub mod models;
pub mod search;
pub mod session;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use convert::{SaveFormat, SplitTable};
pub use download::DatasetDownloader;
pub use hub::{DatasetHub, HfHub, HubError, MockHub};
pub use models::{DatasetSummary, DownloadOptions, DownloadResult, DownloadStatus};
pub use search::DatasetSearch;
pub use session::InteractiveSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
