//! Project identity and descriptor

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adscribe_core::ProjectPaths;
use adscribe_waveform::Waveform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

/// Current descriptor format
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Content of `<name>.proj`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Format version
    pub version: u32,
    /// Display name
    pub name: String,
    /// Source video, relative to the project folder when inside it
    pub video_file: PathBuf,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub modified_at: DateTime<Utc>,
}

/// Input for a brand-new project
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Display name, also the descriptor file stem
    pub name: String,
    /// Project root; must be absolute
    pub folder: PathBuf,
    /// Source video
    pub video_file: PathBuf,
    /// Copy the video into the project folder
    pub copy_video: bool,
}

/// One authoring session
#[derive(Debug, Clone)]
pub struct Project {
    /// Display name
    pub name: String,
    /// Derived file layout
    pub paths: ProjectPaths,
    /// Source video, resolved against the project folder
    pub video_file: PathBuf,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Set once the load pipeline attached it
    pub waveform: Option<Arc<Waveform>>,
}

impl Project {
    pub fn new(name: &str, folder: &Path, video_file: &Path) -> Self {
        let paths = ProjectPaths::new(folder, name);
        Self {
            name: name.to_string(),
            video_file: paths.resolve(video_file),
            paths,
            created_at: Utc::now(),
            waveform: None,
        }
    }

    /// Rebuild a project from its descriptor file and content
    pub fn from_descriptor(
        descriptor_file: &Path,
        descriptor: ProjectDescriptor,
    ) -> Result<Self, ProjectError> {
        let paths = ProjectPaths::from_descriptor(descriptor_file).ok_or_else(|| {
            ProjectError::DescriptorCorrupt {
                path: descriptor_file.to_path_buf(),
                reason: "not a project file path".to_string(),
            }
        })?;
        Ok(Self {
            name: descriptor.name,
            video_file: paths.resolve(&descriptor.video_file),
            paths,
            created_at: descriptor.created_at,
            waveform: None,
        })
    }

    /// Descriptor to persist, stamped with the current time
    pub fn descriptor(&self) -> ProjectDescriptor {
        let video_file = self
            .video_file
            .strip_prefix(&self.paths.folder)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.video_file.clone());
        ProjectDescriptor {
            version: DESCRIPTOR_VERSION,
            name: self.name.clone(),
            video_file,
            created_at: self.created_at,
            modified_at: Utc::now(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.paths.folder
    }

    pub fn has_waveform(&self) -> bool {
        self.waveform.is_some()
    }
}
