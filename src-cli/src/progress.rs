//! Terminal progress bar

use adscribe_waveform::ProgressSink;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// [`ProgressSink`] drawn on stderr
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::hidden());
        if let Ok(style) = ProgressStyle::with_template("{msg:20} [{bar:40}] {pos:>3}%") {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn set_progress(&self, message: &str, percent: f64) {
        self.bar.set_message(message.to_string());
        self.bar.set_position(percent.clamp(0.0, 100.0) as u64);
    }

    fn set_visible(&self, visible: bool) {
        if visible {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.reset();
        } else {
            self.bar.finish_and_clear();
            self.bar.set_draw_target(ProgressDrawTarget::hidden());
        }
    }
}
