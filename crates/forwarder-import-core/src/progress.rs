use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Duration;

use crate::pipeline::ImportStats;

/// Live progress for a streaming import.
///
/// The stream length is unknown up front, so this is a spinner with a running count
/// rather than a bar. Log lines are printed through [`ImportProgress::suspend`] so they
/// do not tear the spinner.
pub struct ImportProgress {
    bar: ProgressBar,
    interval: usize,
}

impl ImportProgress {
    /// Spinner drawn on stderr, with a checkpoint every `interval` messages
    pub fn new(interval: usize) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self::with_bar(bar, interval)
    }

    /// Progress that only logs checkpoints and never draws
    pub fn hidden(interval: usize) -> Self {
        Self::with_bar(ProgressBar::hidden(), interval)
    }

    fn with_bar(bar: ProgressBar, interval: usize) -> Self {
        Self {
            bar,
            interval: interval.max(1),
        }
    }

    /// Change how many messages pass between checkpoints
    pub fn set_interval(&mut self, interval: usize) {
        self.interval = interval.max(1);
    }

    /// Record that the message at `position` in the stream is being examined
    pub fn checkpoint(&self, position: usize) {
        if position % self.interval == 0 {
            self.suspend(|| info!("Checking message {}..", position));
        }
        self.bar.set_message(format!("{} messages checked", position + 1));
    }

    /// Run `f` with the spinner cleared, for log output
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self, stats: &ImportStats) {
        self.bar.finish_and_clear();
        info!(
            "Checked {} messages: {} media, {} kept, {} duplicates, {} non-images, \
             {} failed downloads",
            stats.examined,
            stats.media,
            stats.entries,
            stats.duplicates,
            stats.non_images,
            stats.download_failures
        );
    }
}
