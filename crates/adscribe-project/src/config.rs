//! Per-load settings

use serde::{Deserialize, Serialize};

/// Settings read by the controller on each load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Run silence detection after a fresh waveform extraction
    pub auto_generate_spaces: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            auto_generate_spaces: true,
        }
    }
}
