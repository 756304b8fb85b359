//! Application settings

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use adscribe_project::ProjectConfig;
use adscribe_waveform::SilenceDetectorConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE: &str = "config.json";

/// Settings read from `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detect spaces right after a waveform is extracted
    pub auto_generate_spaces: bool,
    /// Silence detector tuning
    pub silence: SilenceDetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_generate_spaces: ProjectConfig::default().auto_generate_spaces,
            silence: SilenceDetectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Platform config location, if one can be determined
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "adscribe", "Adscribe")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Read the config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid config file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn project_config(&self) -> ProjectConfig {
        ProjectConfig {
            auto_generate_spaces: self.auto_generate_spaces,
        }
    }
}
