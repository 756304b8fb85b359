//! Project error types

use std::path::PathBuf;

use adscribe_waveform::WaveformError;
use thiserror::Error;

/// Project lifecycle errors
#[derive(Error, Debug)]
pub enum ProjectError {
    /// New project folders must be absolute
    #[error("Project folder is not an absolute path: {0}")]
    NotRooted(PathBuf),

    /// The user declined a confirmation
    #[error("Operation cancelled")]
    Cancelled,

    /// Descriptor file absent
    #[error("Project file not found: {0}")]
    DescriptorMissing(PathBuf),

    /// Descriptor file unreadable
    #[error("Project file is corrupt: {path}: {reason}")]
    DescriptorCorrupt { path: PathBuf, reason: String },

    /// Descriptions or spaces file absent
    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    /// Descriptions or spaces file unreadable
    #[error("File is corrupt: {path}: {reason}")]
    FileCorrupt { path: PathBuf, reason: String },

    /// Operation needs a loaded project
    #[error("No project loaded")]
    NoProjectLoaded,

    /// Operation needs the project's waveform
    #[error("Project has no waveform")]
    NoWaveform,

    /// Waveform extraction or cache error
    #[error("Waveform error: {0}")]
    Waveform(#[from] WaveformError),

    /// Background worker panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProjectError {
    /// Declined confirmations are not failures
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProjectError::Cancelled)
    }
}
