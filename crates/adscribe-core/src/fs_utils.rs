//! Filesystem helpers shared by the cache and the project files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replace `path` with `bytes` through a temporary sibling and a rename.
///
/// Readers see either the previous contents or the new ones, never a
/// partial file. The temporary file is removed if the rename fails.
pub fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, bytes)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// `<name>.tmp` next to `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
