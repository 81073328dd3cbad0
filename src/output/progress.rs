//! Progress reporting functionality
//!
//! Bars and spinners draw on stderr so that report output on stdout stays
//! machine-readable.

use crate::core::parallel::ProgressUpdate;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Progress reporter for parsing and detection phases
pub struct ProgressReporter {
    enabled: bool,
    verbose: bool,
    multi_progress: MultiProgress,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// A disabled reporter draws nothing and ignores every update
    pub fn new(enabled: bool, verbose: bool) -> Self {
        let multi_progress = MultiProgress::new();
        let bar = enabled.then(|| {
            let bar = multi_progress.add(ProgressBar::new(0));
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        });

        Self {
            enabled,
            verbose,
            multi_progress,
            bar,
        }
    }

    /// Reset the bar for a new operation
    pub fn start(&self, total: usize, operation: &str) {
        if let Some(bar) = &self.bar {
            bar.reset();
            bar.set_length(total as u64);
            bar.set_message(operation.to_string());
        }
    }

    pub fn update(&self, current: usize, total: usize, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
            if self.verbose {
                bar.set_message(message.to_string());
            }
        }
    }

    pub fn update_from(&self, progress: ProgressUpdate) {
        self.update(progress.current, progress.total, &progress.message);
    }

    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Clear the bar entirely, e.g. before printing an error
    pub fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// A spinner for phases without a known length
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let spinner = self.multi_progress.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Create a progress callback function that updates a ProgressReporter
pub fn create_progress_callback(reporter: Arc<ProgressReporter>) -> impl Fn(ProgressUpdate) + Send + Sync {
    move |progress: ProgressUpdate| {
        reporter.update_from(progress);
    }
}
