//! Full repository snapshot downloads.

use std::path::Path;
use std::sync::Arc;

use crate::hub::{DatasetHub, HubError, RepoFile};
use crate::ui;
use crate::utils::{with_retry, RetrySettings};

/// Suffixes never mirrored into a snapshot
const EXCLUDED_SUFFIXES: [&str; 2] = [".lock", ".tmp"];

/// Outcome counters for a snapshot pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Files fetched from the hub
    pub fetched: usize,
    /// Files skipped because they were already complete on disk
    pub skipped: usize,
    /// Bytes written by the fetched files
    pub bytes: u64,
}

fn is_excluded(path: &str) -> bool {
    EXCLUDED_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

fn already_complete(target: &Path, expected: u64) -> bool {
    std::fs::metadata(target)
        .map(|meta| meta.is_file() && meta.len() == expected)
        .unwrap_or(false)
}

/// Mirror a dataset repository tree into `dest`.
///
/// Lock and temp files are skipped, and files already present with the
/// expected size are not fetched again, so an interrupted snapshot can be
/// resumed. Each file fetch is retried independently; a failure that
/// survives its retries aborts the snapshot, leaving completed files in
/// place for the next attempt.
pub async fn snapshot_repo(
    hub: &Arc<dyn DatasetHub>,
    dataset_id: &str,
    dest: &Path,
    settings: RetrySettings,
    progress: bool,
) -> Result<SnapshotReport, HubError> {
    let files = with_retry(settings, || hub.list_files(dataset_id)).await?;

    std::fs::create_dir_all(dest)?;

    let targets: Vec<&RepoFile> = files
        .iter()
        .filter(|file| file.is_file() && !is_excluded(&file.path))
        .collect();

    let bar = if progress {
        Some(ui::create_progress_bar(
            targets.len() as u64,
            "Downloading",
        ))
    } else {
        None
    };

    let mut report = SnapshotReport {
        fetched: 0,
        skipped: 0,
        bytes: 0,
    };

    for file in &targets {
        let target = dest.join(&file.path);

        if already_complete(&target, file.size) {
            tracing::debug!("Skipping '{}', already complete", file.path);
            report.skipped += 1;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let written =
                with_retry(settings, || hub.fetch_file(dataset_id, &file.path, &target)).await?;
            report.fetched += 1;
            report.bytes += written;
        }

        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = &bar {
        bar.finish_with_success(&format!(
            "Snapshot of {} complete ({} fetched, {} up to date, {})",
            dataset_id,
            report.fetched,
            report.skipped,
            ui::format_file_size(report.bytes)
        ));
    }

    tracing::info!(
        "Snapshot of '{}': {} files fetched, {} already present, {} written",
        dataset_id,
        report.fetched,
        report.skipped,
        ui::format_file_size(report.bytes)
    );

    Ok(report)
}
