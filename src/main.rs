use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use hubfetch::config::{find_config_file, get_config, load_config, Config};
use hubfetch::convert::SaveFormat;
use hubfetch::download::DatasetDownloader;
use hubfetch::hub::{DatasetHub, HfHub};
use hubfetch::models::{DatasetSummary, DownloadOptions, DownloadStatus};
use hubfetch::print_status;
use hubfetch::search::{DatasetSearch, DEFAULT_TOP_K};
use hubfetch::session::InteractiveSession;
use hubfetch::ui;
use hubfetch::utils::{BoundedTimeout, RetrySettings};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// hubfetch - Search, download and convert datasets from the Hugging Face Hub
#[derive(Parser, Debug)]
#[command(name = "hubfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search, download and convert datasets from the Hugging Face Hub", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hub endpoint override
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format, one dataset id per line
    Plain,
}

/// Save format for converted splits
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// Comma-separated values with a header row
    Csv,
    /// A single JSON array of row objects
    Json,
    /// Parquet with default writer settings
    Parquet,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search datasets by keyword
    #[command(alias = "s")]
    Search {
        /// Search keyword
        keyword: String,

        /// Maximum number of results
        #[arg(long, short, default_value_t = DEFAULT_TOP_K)]
        limit: usize,
    },

    /// Download a dataset and optionally convert its splits
    #[command(alias = "d")]
    Download {
        /// Dataset id, e.g. "stanfordnlp/imdb"
        dataset_id: String,

        /// Directory that receives the files (default: ./data, or
        /// downloads.default_path from the config file)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Convert parquet splits into this format
        #[arg(long, short, value_enum)]
        format: Option<Format>,

        /// Keep only a random sample of rows per split
        #[arg(long)]
        sample: Option<usize>,

        /// Skip the raw repository snapshot
        #[arg(long)]
        no_snapshot: bool,
    },

    /// Guided search-and-download session
    #[command(alias = "i")]
    Interactive,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hubfetch={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from file if specified or found in default locations
    let config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };

    let hub = build_hub(&cli, &config)?;
    let settings = config.retry.settings();
    let pool = config.retry.worker_pool();

    match cli.command {
        Some(Commands::Search { keyword, limit }) => {
            let search = DatasetSearch::with_settings(Arc::clone(&hub), settings, pool);

            let spinner = ui::Spinner::new(&format!("Searching for '{}'...", keyword));
            match search.search_detailed(&keyword, limit).await {
                Ok(datasets) => {
                    spinner.finish_with_success(&format!("Found {} datasets", datasets.len()));
                    output_datasets(&datasets, cli.output);
                }
                Err(error) => {
                    spinner.finish_with_error("Search failed");
                    return Err(error.into());
                }
            }
        }

        Some(Commands::Download {
            dataset_id,
            output,
            format,
            sample,
            no_snapshot,
        }) => {
            let downloader = DatasetDownloader::with_settings(Arc::clone(&hub), settings)
                .progress(!cli.quiet && ui::is_terminal());

            let output_dir = output.unwrap_or_else(|| config.downloads.default_path.clone());
            let mut options = DownloadOptions::new(output_dir).download_all(!no_snapshot);
            if let Some(format) = format {
                options = options.save_format(format_to_save(format));
            }
            if let Some(rows) = sample {
                options = options.sample(rows);
            }

            let result = downloader.download(&dataset_id, &options).await;
            match result.status {
                DownloadStatus::Success => {
                    print_status!(
                        Status::Success,
                        format!(
                            "Saved {} file(s) in {:.1}s",
                            result.saved_files.len(),
                            result.time_used
                        )
                    );
                    for path in &result.saved_files {
                        println!("  {}", path.display());
                    }
                }
                DownloadStatus::Error => {
                    print_status!(
                        Status::Error,
                        format!(
                            "Download failed: {}",
                            result.message.as_deref().unwrap_or("unknown error")
                        )
                    );
                    std::process::exit(1);
                }
            }
        }

        Some(Commands::Interactive) => {
            run_interactive(hub, settings, pool, &config).await?;
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "hubfetch", &mut std::io::stdout());
        }

        None => {
            ui::print_banner();
            run_interactive(hub, settings, pool, &config).await?;
        }
    }

    Ok(())
}

async fn run_interactive(
    hub: Arc<dyn DatasetHub>,
    settings: RetrySettings,
    pool: BoundedTimeout,
    config: &Config,
) -> Result<()> {
    let search = DatasetSearch::with_settings(Arc::clone(&hub), settings, pool);
    let downloader = DatasetDownloader::with_settings(hub, settings).progress(ui::is_terminal());
    let mut session = InteractiveSession::from_stdio(search, downloader)
        .default_dir(config.downloads.default_path.clone());

    tokio::select! {
        result = session.run() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Cancelled.");
            Ok(())
        }
    }
}

fn build_hub(cli: &Cli, config: &Config) -> Result<Arc<dyn DatasetHub>> {
    let endpoint = cli.endpoint.as_deref().unwrap_or(&config.hub.endpoint);

    let mut hub = HfHub::with_endpoint(endpoint)?;
    if let Some(token) = &config.hub.token {
        hub = hub.token(token.clone());
    }

    Ok(Arc::new(hub))
}

fn format_to_save(format: Format) -> SaveFormat {
    match format {
        Format::Csv => SaveFormat::Csv,
        Format::Json => SaveFormat::Json,
        Format::Parquet => SaveFormat::Parquet,
    }
}

fn output_datasets(datasets: &[DatasetSummary], format: OutputFormat) {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(datasets).unwrap());
        }
        OutputFormat::Plain => {
            for dataset in datasets {
                println!("{}", dataset.id);
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Dataset", "Downloads", "Likes", "Updated"]);

            for dataset in datasets {
                let id = ui::truncate_with_ellipsis(&dataset.id, 50);
                let downloads = dataset
                    .downloads
                    .map(|count| ui::format_number(count as usize))
                    .unwrap_or_default();
                let likes = dataset
                    .likes
                    .map(|count| ui::format_number(count as usize))
                    .unwrap_or_default();
                let updated = dataset
                    .last_modified
                    .map(|stamp| stamp.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();

                table.add_row(vec![
                    Cell::new(id).add_attribute(Attribute::Bold),
                    Cell::new(downloads),
                    Cell::new(likes),
                    Cell::new(updated),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
}
