//! Output formatting utilities

use std::sync::Mutex;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use airlift_core::{EventSink, PipelineEvent};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Event sink that renders pipeline progress on the console.
///
/// Stage transitions and messages become styled lines, download progress
/// becomes an indicatif bar, and log files are dumped with a dim header.
pub struct ConsoleSink {
    quiet: bool,
    progress: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    /// Create a sink; `quiet` suppresses everything except log dumps
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress: Mutex::new(None),
        }
    }

    fn update_progress(&self, received: u64, total: Option<u64>) {
        let Ok(mut slot) = self.progress.lock() else {
            return;
        };

        let bar = slot.get_or_insert_with(|| match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "  {bar:30.cyan/dim} {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("  {spinner} {bytes} downloaded")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        });
        bar.set_position(received);

        if total.is_some_and(|total| received >= total) {
            bar.finish_and_clear();
            *slot = None;
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(stage) => {
                if !self.quiet {
                    info(stage.name());
                }
            }
            PipelineEvent::StageFinished(stage) => {
                if !self.quiet {
                    success(stage.name());
                }
            }
            PipelineEvent::Message(message) => {
                if !self.quiet {
                    println!("  {}", style(message).dim());
                }
            }
            PipelineEvent::DownloadProgress { received, total } => {
                if !self.quiet {
                    self.update_progress(received, total);
                }
            }
            PipelineEvent::LogFile { name, content } => {
                println!("{}", style(format!("--- {} ---", name)).dim());
                println!("{}", content);
            }
        }
    }
}
