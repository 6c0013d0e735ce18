// file: src/pipeline/progress.rs
// description: progress reporting sinks for repository indexing
// reference: uses indicatif for progress bars and tracing for log output

use crate::utils::logging::format_progress;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Receives coarse progress updates from a long-running operation.
///
/// Purely observational: a sink cannot cancel the operation it watches.
pub trait ProgressSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn report_progress(&self, current: u64, total: u64);
}

/// Forwards progress to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn report_progress(&self, current: u64, total: u64) {
        info!("{}", format_progress(current, total, "complete"));
    }
}

/// Terminal progress bar with a message line underneath.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    start_time: Instant,
    last_error: Mutex<Option<String>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_color(true)
    }

    pub fn with_color(colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, 100, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            start_time: Instant::now(),
            last_error: Mutex::new(None),
        }
    }

    pub fn position(&self) -> u64 {
        self.main_bar.position()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    pub fn finish(&self) {
        if self.last_error().is_some() {
            self.main_bar.abandon_with_message("Indexing failed".red().to_string());
        } else {
            self.main_bar.finish_with_message("Indexing complete");
        }
        self.detail_bar.finish_and_clear();
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressTracker {
    fn info(&self, message: &str) {
        self.detail_bar.set_message(message.to_string());
    }

    fn error(&self, message: &str) {
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(message.to_string());
        }
        self.detail_bar.set_message(message.red().to_string());
    }

    fn report_progress(&self, current: u64, total: u64) {
        if self.main_bar.length() != Some(total) {
            self.main_bar.set_length(total);
        }
        self.main_bar.set_position(current.min(total));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let style = if colored {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .map(|s| s.progress_chars("█▓▒░"))
    } else {
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}")
            .map(|s| s.progress_chars("=>-"))
    };
    bar.set_style(style.unwrap_or_else(|_| ProgressStyle::default_bar()));
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracker_position() {
        let tracker = ProgressTracker::with_color(false);

        tracker.report_progress(40, 100);
        assert_eq!(tracker.position(), 40);

        tracker.report_progress(150, 100);
        assert_eq!(tracker.position(), 100);
    }

    #[test]
    fn test_progress_tracker_records_error() {
        let tracker = ProgressTracker::new();
        assert!(tracker.last_error().is_none());

        tracker.error("clone failed");
        assert_eq!(tracker.last_error().as_deref(), Some("clone failed"));
    }

    #[test]
    fn test_log_progress_is_object_safe() {
        let sink: &dyn ProgressSink = &LogProgress;
        sink.info("starting");
        sink.report_progress(10, 100);
    }
}
