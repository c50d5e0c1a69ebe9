//! Spinners for long-running phases
//!
//! Drawn on stderr only, so the stdout marker stream is never disturbed. indicatif
//! hides the spinner when stderr is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Spinner shown while downloading or installing
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        pb.set_style(style);
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }

    /// Clear the spinner on success
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Leave the last message visible on error
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
