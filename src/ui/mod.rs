//! CLI UI utilities for terminal output.
//!
//! This module provides status icons, progress indicators, and styled
//! formatting helpers for the command-line surface.

use std::io::IsTerminal;
use std::time::Duration;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Download => "↓",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Download,
    Search,
}

/// Print a styled status message.
#[macro_export]
macro_rules! print_status {
    ($status:expr, $msg:expr) => {{
        use owo_colors::OwoColorize;
        use $crate::ui::{status_icon, Status};
        let icon = status_icon($status);
        match $status {
            Status::Success => println!("{} {}", icon.green().bold(), $msg),
            Status::Error => println!("{} {}", icon.red().bold(), $msg),
            Status::Warning => println!("{} {}", icon.yellow().bold(), $msg),
            Status::Info => println!("{} {}", icon.cyan().bold(), $msg),
            Status::Download => println!("{} {}", icon.magenta(), $msg),
            Status::Search => println!("{} {}", icon.yellow(), $msg),
        }
    }};
}

/// Welcome banner for the application.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");

    println!();
    println!("╔═══════════════════════════════════════════════════════════════════════╗");
    println!(
        "║                         🤗 hubfetch v{}                             ║",
        version
    );
    println!("║                                                                       ║");
    println!("║   Search, download & convert datasets from the Hugging Face Hub       ║");
    println!("║                                                                       ║");
    println!("║   Examples:                                                           ║");
    println!("║     hubfetch search \"sentiment analysis\"                              ║");
    println!("║     hubfetch download stanfordnlp/imdb --format csv                   ║");
    println!("║     hubfetch interactive                                              ║");
    println!("╚═══════════════════════════════════════════════════════════════════════╝");
    println!();
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 || max_width <= 3 {
        return "...".to_string();
    }

    // Use unicode-width to properly handle wide characters
    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    // Find the longest prefix that fits
    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Print a loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap()
                .tick_chars("✓ ✗ "),
        );
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.red} {msg}")
                .unwrap()
                .tick_chars("✓ ✗ "),
        );
        self.pb.finish_with_message(msg.to_string());
    }

    /// Set an upper bound for progress updates.
    pub fn set_length(&self, len: u64) {
        self.pb.set_length(len);
    }

    /// Increment progress.
    pub fn inc(&self, delta: u64) {
        self.pb.inc(delta);
    }

    /// Set progress.
    pub fn set_position(&self, pos: u64) {
        self.pb.set_position(pos);
    }

    /// Finish the spinner.
    pub fn finish(&self) {
        self.pb.finish();
    }
}

/// Create a progress bar for downloads.
pub fn create_progress_bar(len: u64, msg: &str) -> Spinner {
    let pb = indicatif::ProgressBar::new(len);
    pb.set_style(
        indicatif::ProgressStyle::with_template(
            "{msg}: {bar:40.cyan/blue} {pos}/{len} ({percent}%)",
        )
        .unwrap()
        .progress_chars("█▓▒░ "),
    );
    pb.set_message(msg.to_string());

    Spinner { pb }
}
