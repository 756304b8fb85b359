//! Fixed layout of a project folder

use std::path::{Path, PathBuf};

/// Extension of the project descriptor file
pub const PROJECT_EXTENSION: &str = "proj";
/// Folder holding recorded description clips
pub const DESCRIPTIONS_FOLDER: &str = "Descriptions";
/// Folder holding derived artifacts
pub const CACHE_FOLDER: &str = "Cache";
pub const DESCRIPTIONS_FILE: &str = "descriptions.json";
pub const SPACES_FILE: &str = "spaces.json";
pub const WAVEFORM_HEADER_FILE: &str = "waveform.header";
pub const WAVEFORM_DATA_FILE: &str = "waveform.data";

/// Every path derived from a project folder and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Project root
    pub folder: PathBuf,
    /// `<folder>/<name>.proj`
    pub descriptor_file: PathBuf,
    pub descriptions_folder: PathBuf,
    pub cache_folder: PathBuf,
    pub descriptions_file: PathBuf,
    pub spaces_file: PathBuf,
    pub waveform_header_file: PathBuf,
    pub waveform_data_file: PathBuf,
}

impl ProjectPaths {
    pub fn new(folder: &Path, name: &str) -> Self {
        let cache_folder = folder.join(CACHE_FOLDER);
        Self {
            folder: folder.to_path_buf(),
            descriptor_file: folder.join(format!("{}.{}", name, PROJECT_EXTENSION)),
            descriptions_folder: folder.join(DESCRIPTIONS_FOLDER),
            descriptions_file: folder.join(DESCRIPTIONS_FILE),
            spaces_file: folder.join(SPACES_FILE),
            waveform_header_file: cache_folder.join(WAVEFORM_HEADER_FILE),
            waveform_data_file: cache_folder.join(WAVEFORM_DATA_FILE),
            cache_folder,
        }
    }

    /// Derive the layout from a descriptor path (`<folder>/<name>.proj`)
    pub fn from_descriptor(descriptor_file: &Path) -> Option<Self> {
        let folder = descriptor_file.parent()?;
        let name = descriptor_file.file_stem()?.to_str()?;
        Some(Self::new(folder, name))
    }

    /// Resolve a path stored relative to the project folder
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.folder.join(path)
        }
    }
}
