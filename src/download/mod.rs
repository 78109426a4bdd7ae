//! Dataset downloads: repository snapshots and split conversion.
//!
//! [`DatasetDownloader`] drives the two download modes behind
//! [`DownloadOptions`]: mirroring the raw repository tree into a
//! per-dataset directory, and loading parquet splits to re-save them in a
//! requested format. Every run produces a [`DownloadResult`] rather than
//! an error, so callers can always report elapsed time and a message.

mod snapshot;

pub use snapshot::{snapshot_repo, SnapshotReport};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::convert::load_splits;
use crate::hub::{DatasetHub, HubError};
use crate::models::{DownloadOptions, DownloadResult};
use crate::utils::{with_retry, RetrySettings};

/// Turn a dataset id into a name safe for local paths ("org/name" becomes
/// "org_name").
pub fn sanitize_dataset_id(id: &str) -> String {
    id.replace('/', "_")
}

/// Downloads dataset repositories and converts their splits.
#[derive(Debug, Clone)]
pub struct DatasetDownloader {
    hub: Arc<dyn DatasetHub>,
    settings: RetrySettings,
    progress: bool,
}

impl DatasetDownloader {
    /// Create a downloader with default retry settings.
    pub fn new(hub: Arc<dyn DatasetHub>) -> Self {
        Self {
            hub,
            settings: RetrySettings::default(),
            progress: false,
        }
    }

    /// Create a downloader with explicit retry settings.
    pub fn with_settings(hub: Arc<dyn DatasetHub>, settings: RetrySettings) -> Self {
        Self {
            hub,
            settings,
            progress: false,
        }
    }

    /// Show progress bars while snapshotting. Off by default so library
    /// callers and tests stay quiet.
    pub fn progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Download a dataset according to `options`.
    ///
    /// This never returns an error: failures are folded into an
    /// error-status [`DownloadResult`] carrying the elapsed time and a
    /// message describing the cause. Files written before the failure are
    /// left on disk for a later resume.
    pub async fn download(&self, dataset_id: &str, options: &DownloadOptions) -> DownloadResult {
        let started = Instant::now();

        match self.run(dataset_id, options).await {
            Ok(saved_files) => {
                DownloadResult::success(saved_files, started.elapsed().as_secs_f64())
            }
            Err(error) => {
                tracing::error!("Download of '{}' failed: {}", dataset_id, error);
                DownloadResult::error(error.to_string(), started.elapsed().as_secs_f64())
            }
        }
    }

    async fn run(
        &self,
        dataset_id: &str,
        options: &DownloadOptions,
    ) -> Result<Vec<PathBuf>, HubError> {
        if dataset_id.trim().is_empty() {
            return Err(HubError::InvalidRequest(
                "dataset id must not be empty".to_string(),
            ));
        }

        std::fs::create_dir_all(&options.output_dir)?;

        let sanitized = sanitize_dataset_id(dataset_id);
        let mut saved_files = Vec::new();

        if options.download_all {
            let dest = options.output_dir.join(&sanitized);
            snapshot_repo(&self.hub, dataset_id, &dest, self.settings, self.progress).await?;
            saved_files.push(dest);
        }

        if let Some(format) = options.save_format {
            let splits =
                with_retry(self.settings, || load_splits(self.hub.as_ref(), dataset_id)).await?;

            for (split, table) in splits {
                let table = match options.sample {
                    Some(rows) => table.sample(rows)?,
                    None => table,
                };

                let file_name = format!("{}_{}.{}", sanitized, split, format.extension());
                let path = options.output_dir.join(file_name);
                table.write(format, &path)?;

                tracing::info!(
                    "Saved {} rows of split '{}' to {}",
                    table.num_rows(),
                    split,
                    path.display()
                );
                saved_files.push(path);
            }
        }

        Ok(saved_files)
    }
}
