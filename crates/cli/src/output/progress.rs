//! Progress bar for upload batches
//!
//! Counts finished files while the batch runs. In quiet or JSON mode,
//! progress is suppressed.

use super::OutputConfig;

/// Progress bar wrapper
///
/// Cheap to clone; clones drive the same bar.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a progress bar counting `total` files
    pub fn new(config: &OutputConfig, total: u64) -> Self {
        let bar = config.shows_progress().then(|| {
            let bar = indicatif::ProgressBar::new(total);
            let style = indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        });

        Self { bar }
    }

    /// Increment progress
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Number of files counted so far
    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.as_ref().map_or(0, |bar| bar.position())
    }

    /// Check if progress bar is visible
    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let bar = ProgressBar::new(&config, 100);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_progress_bar_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let bar = ProgressBar::new(&config, 100);
        assert!(!bar.is_visible());
        bar.inc(1);
        assert_eq!(bar.position(), 0);
    }

    #[test]
    fn test_progress_bar_no_progress() {
        let config = OutputConfig {
            no_progress: true,
            ..Default::default()
        };
        let bar = ProgressBar::new(&config, 100);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_progress_bar_counts_files() {
        let bar = ProgressBar::new(&OutputConfig::default(), 3);
        assert!(bar.is_visible());
        let shared = bar.clone();
        shared.inc(1);
        shared.inc(1);
        assert_eq!(bar.position(), 2);
        bar.finish_and_clear();
    }
}
