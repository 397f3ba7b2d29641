//! Terminal output for dpu
//!
//! Batch summaries, dry-run plans and discovery listings are rendered
//! either as text or as a single JSON document on stdout. Failures,
//! warnings and the progress bar stay on stderr.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Output switches shared by every command
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Print one JSON document instead of text
    pub json: bool,
    /// No ANSI colors in text output
    pub no_color: bool,
    /// Hide the upload progress bar
    pub no_progress: bool,
    /// Only errors (and JSON documents) are printed
    pub quiet: bool,
}

impl OutputConfig {
    /// Whether a progress bar should be drawn
    pub fn shows_progress(&self) -> bool {
        !(self.quiet || self.json || self.no_progress)
    }
}
