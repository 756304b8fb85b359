//! Application state management

use std::sync::Arc;

use adscribe_project::{ProjectConfig, ProjectController};
use adscribe_waveform::{SilenceDetector, SymphoniaExtractor};

use crate::config::AppConfig;
use crate::progress::TerminalProgress;

/// Main application state
pub struct AppState {
    /// Loaded settings
    pub config: AppConfig,
    /// Lifecycle controller, driven from the main task only
    pub controller: ProjectController,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let controller = ProjectController::new(
            Arc::new(SymphoniaExtractor::default()),
            Arc::new(SilenceDetector::new(config.silence)),
            Arc::new(TerminalProgress::new()),
        );
        Self { config, controller }
    }

    pub fn project_config(&self) -> ProjectConfig {
        self.config.project_config()
    }
}
