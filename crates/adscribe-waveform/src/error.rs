//! Waveform error types

use std::path::PathBuf;

use thiserror::Error;

/// Waveform-related errors
#[derive(Error, Debug)]
pub enum WaveformError {
    /// Source file not found
    #[error("Audio source not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid audio format
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    /// Extraction failed
    #[error("Waveform extraction failed: {0}")]
    ExtractionFailed(String),

    /// Cached file absent
    #[error("Waveform cache file missing: {0}")]
    CacheMissing(PathBuf),

    /// Cached file unreadable
    #[error("Waveform cache file corrupt: {path}: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// WAV decoding error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
