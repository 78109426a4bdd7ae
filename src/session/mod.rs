//! Interactive search-and-download session.
//!
//! [`InteractiveSession`] walks a user through one keyword search, a
//! dataset pick from the numbered results, the save format and output
//! directory, and an optional row sample, then runs the download and
//! prints a summary. Input and output are generic so tests can script a
//! whole session against in-memory buffers.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::convert::SaveFormat;
use crate::download::DatasetDownloader;
use crate::models::{DownloadOptions, DownloadStatus};
use crate::search::{DatasetSearch, DEFAULT_TOP_K};
use crate::ui;

/// One guided search-and-download conversation.
pub struct InteractiveSession<R, W> {
    input: R,
    output: W,
    search: DatasetSearch,
    downloader: DatasetDownloader,
    default_dir: PathBuf,
}

impl InteractiveSession<BufReader<Stdin>, std::io::Stdout> {
    /// Create a session reading from stdin and writing to stdout.
    pub fn from_stdio(search: DatasetSearch, downloader: DatasetDownloader) -> Self {
        Self::new(
            search,
            downloader,
            BufReader::new(tokio::io::stdin()),
            std::io::stdout(),
        )
    }
}

impl<R, W> InteractiveSession<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Create a session over arbitrary input and output channels.
    pub fn new(search: DatasetSearch, downloader: DatasetDownloader, input: R, output: W) -> Self {
        Self {
            input,
            output,
            search,
            downloader,
            default_dir: PathBuf::from("./data"),
        }
    }

    /// Directory offered when the user accepts the download prompt default.
    pub fn default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = dir.into();
        self
    }

    /// Run one full conversation. Every exit path is a clean `Ok`: bad
    /// answers and closed input end the session with a notice, and
    /// download failures are reported in the summary.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let keyword = match self.prompt("Enter a search keyword: ").await? {
            Some(line) => line,
            None => return self.abort(),
        };

        if keyword.is_empty() {
            writeln!(self.output, "No keyword given, nothing to do.")?;
            return Ok(());
        }

        let spinner = ui::Spinner::new("Searching datasets...");
        let datasets = match self.search.search_detailed(&keyword, DEFAULT_TOP_K).await {
            Ok(datasets) => {
                spinner.finish_with_success(&format!("Found {} datasets", datasets.len()));
                datasets
            }
            Err(error) => {
                spinner.finish_with_error("Search failed");
                writeln!(self.output, "Search failed: {}", error)?;
                return Ok(());
            }
        };

        if datasets.is_empty() {
            writeln!(self.output, "No datasets matched '{}'.", keyword)?;
            return Ok(());
        }

        writeln!(self.output)?;
        writeln!(self.output, "Matching datasets:")?;
        for (index, dataset) in datasets.iter().enumerate() {
            let downloads = dataset
                .downloads
                .map(|count| ui::format_number(count as usize))
                .unwrap_or_else(|| "-".to_string());
            let likes = dataset
                .likes
                .map(|count| ui::format_number(count as usize))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                self.output,
                "  {}. {} ({} downloads, {} likes)",
                index + 1,
                dataset.id,
                downloads,
                likes
            )?;
        }
        writeln!(self.output)?;

        let selection = match self
            .prompt(&format!("Select a dataset [1-{}]: ", datasets.len()))
            .await?
        {
            Some(line) => line,
            None => return self.abort(),
        };

        let choice = match selection.parse::<usize>() {
            Ok(n) if (1..=datasets.len()).contains(&n) => n,
            _ => {
                writeln!(self.output, "Invalid selection '{}'.", selection)?;
                return Ok(());
            }
        };
        let dataset_id = datasets[choice - 1].id.clone();

        let format_input = match self.prompt("Save format (csv/json/parquet) [csv]: ").await? {
            Some(line) => line,
            None => return self.abort(),
        };

        let format = if format_input.is_empty() {
            SaveFormat::Csv
        } else {
            match SaveFormat::parse(&format_input) {
                Some(format) => format,
                None => {
                    writeln!(
                        self.output,
                        "Unknown format '{}', falling back to csv.",
                        format_input
                    )?;
                    SaveFormat::Csv
                }
            }
        };

        let dir_input = match self
            .prompt(&format!(
                "Download directory [{}]: ",
                self.default_dir.display()
            ))
            .await?
        {
            Some(line) => line,
            None => return self.abort(),
        };

        let output_dir = if dir_input.is_empty() {
            self.default_dir.clone()
        } else {
            PathBuf::from(dir_input)
        };

        let sample_input = match self.prompt("Sample rows (blank for all): ").await? {
            Some(line) => line,
            None => return self.abort(),
        };

        let sample = if sample_input.is_empty() {
            None
        } else {
            match sample_input.parse::<usize>() {
                Ok(rows) => Some(rows),
                Err(_) => {
                    writeln!(self.output, "Invalid sample size '{}'.", sample_input)?;
                    return Ok(());
                }
            }
        };

        let mut options = DownloadOptions::new(output_dir).save_format(format);
        if let Some(rows) = sample {
            options = options.sample(rows);
        }

        writeln!(self.output, "Downloading '{}'...", dataset_id)?;
        let result = self.downloader.download(&dataset_id, &options).await;

        match result.status {
            DownloadStatus::Success => {
                writeln!(
                    self.output,
                    "Saved {} file(s) in {:.1}s:",
                    result.saved_files.len(),
                    result.time_used
                )?;
                for path in &result.saved_files {
                    writeln!(self.output, "  {}", path.display())?;
                }
            }
            DownloadStatus::Error => {
                writeln!(
                    self.output,
                    "Download failed: {}",
                    result.message.as_deref().unwrap_or("unknown error")
                )?;
            }
        }

        Ok(())
    }

    async fn prompt(&mut self, message: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn abort(&mut self) -> std::io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Aborted.")?;
        Ok(())
    }
}
