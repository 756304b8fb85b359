//! Progress reporting for long-running extraction

use std::sync::Mutex;

/// Receives progress from the extraction worker. Must tolerate calls from
/// any thread.
pub trait ProgressSink: Send + Sync {
    /// Report the current step and its completion (0 - 100)
    fn set_progress(&self, message: &str, percent: f64);

    /// Show or hide the indicator
    fn set_visible(&self, visible: bool);
}

/// Sink that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_progress(&self, _message: &str, _percent: f64) {}

    fn set_visible(&self, _visible: bool) {}
}

/// Snapshot of a [`LoadingProgress`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Current step
    pub message: String,
    /// Current value
    pub value: f64,
    /// Value at completion
    pub maximum: f64,
    /// Whether the indicator is shown
    pub visible: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            message: String::new(),
            value: 0.0,
            maximum: 100.0,
            visible: false,
        }
    }
}

/// Thread-safe progress holder; the last write wins
#[derive(Debug, Default)]
pub struct LoadingProgress {
    state: Mutex<ProgressState>,
}

impl LoadingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        // A panicking writer cannot leave the plain-data state inconsistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for LoadingProgress {
    fn set_progress(&self, message: &str, percent: f64) {
        let mut state = self.lock();
        state.message = message.to_string();
        state.value = percent.clamp(0.0, state.maximum);
    }

    fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }
}
