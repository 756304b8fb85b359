//! Waveform cache files
//!
//! The header is stored as JSON, the data as little-endian `i16`. Files are
//! written to a temporary sibling and renamed into place. When storing a
//! whole waveform the old data file is removed first and the new data file
//! is renamed last, so a data file never sits next to a header it does not
//! belong to.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use adscribe_core::fs_utils::write_replacing;
use tracing::{debug, info};

use crate::error::WaveformError;
use crate::waveform::{Waveform, WaveformHeader};

/// Whether a complete cached waveform is available.
///
/// A header without data, or data without a header, does not count.
pub fn exists(header_path: &Path, data_path: &Path) -> bool {
    header_path.is_file() && data_path.is_file()
}

/// Read the header file
pub fn read_header(path: &Path) -> Result<WaveformHeader, WaveformError> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|e| corrupt(path, e.to_string()))
}

/// Replace the header file
pub fn write_header(path: &Path, header: &WaveformHeader) -> Result<(), WaveformError> {
    let bytes = serde_json::to_vec_pretty(header).map_err(|e| corrupt(path, e.to_string()))?;
    Ok(write_replacing(path, &bytes)?)
}

/// Read the sample data file
pub fn read_data(path: &Path) -> Result<Vec<i16>, WaveformError> {
    let bytes = read_file(path)?;
    if bytes.len() % 2 != 0 {
        return Err(corrupt(path, format!("odd byte count {}", bytes.len())));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Replace the sample data file
pub fn write_data(path: &Path, data: &[i16]) -> Result<(), WaveformError> {
    let mut bytes = Vec::with_capacity(data.len() * 2);
    for sample in data {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(write_replacing(path, &bytes)?)
}

/// Load a cached waveform
pub fn load(header_path: &Path, data_path: &Path) -> Result<Waveform, WaveformError> {
    let header = read_header(header_path)?;
    let data = read_data(data_path)?;
    debug!("Loaded {} cached waveform samples", data.len());
    Waveform::new(header, data)
}

/// Store a waveform, creating the cache folder if needed
pub fn store(header_path: &Path, data_path: &Path, waveform: &Waveform) -> Result<(), WaveformError> {
    for path in [header_path, data_path] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }

    match fs::remove_file(data_path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    write_header(header_path, waveform.header())?;
    write_data(data_path, waveform.data())?;

    info!(
        "Stored waveform cache ({} samples) at {}",
        waveform.len(),
        data_path.display()
    );
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, WaveformError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => WaveformError::CacheMissing(path.to_path_buf()),
        _ => WaveformError::IoError(e),
    })
}

fn corrupt(path: &Path, reason: String) -> WaveformError {
    WaveformError::CacheCorrupt {
        path: path.to_path_buf(),
        reason,
    }
}
