//! On-disk project artifacts
//!
//! Every write replaces the previous file through a temporary sibling and a
//! rename. Every read fails with a missing or corrupt error instead of
//! returning partial data.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use adscribe_core::fs_utils::write_replacing;
use adscribe_core::{Description, ProjectPaths, Space};
use adscribe_waveform::{cache, Waveform};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProjectError;
use crate::project::ProjectDescriptor;

/// Read `<name>.proj`
pub fn read_descriptor(path: &Path) -> Result<ProjectDescriptor, ProjectError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ProjectError::DescriptorMissing(path.to_path_buf()),
        _ => ProjectError::IoError(e),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ProjectError::DescriptorCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn write_descriptor(path: &Path, descriptor: &ProjectDescriptor) -> Result<(), ProjectError> {
    write_json(path, descriptor)
}

pub fn read_descriptions(path: &Path) -> Result<Vec<Description>, ProjectError> {
    read_json(path)
}

pub fn write_descriptions(path: &Path, descriptions: &[Description]) -> Result<(), ProjectError> {
    write_json(path, &descriptions)
}

pub fn read_spaces(path: &Path) -> Result<Vec<Space>, ProjectError> {
    read_json(path)
}

pub fn write_spaces(path: &Path, spaces: &[Space]) -> Result<(), ProjectError> {
    write_json(path, &spaces)
}

/// Read the cached waveform header and data
pub fn read_waveform(paths: &ProjectPaths) -> Result<Waveform, ProjectError> {
    Ok(cache::load(&paths.waveform_header_file, &paths.waveform_data_file)?)
}

/// Write the waveform header and data, creating the cache folder if absent
pub fn write_waveform(paths: &ProjectPaths, waveform: &Waveform) -> Result<(), ProjectError> {
    Ok(cache::store(
        &paths.waveform_header_file,
        &paths.waveform_data_file,
        waveform,
    )?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ProjectError::FileMissing(path.to_path_buf()),
        _ => ProjectError::IoError(e),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ProjectError::FileCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| ProjectError::FileCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(write_replacing(path, &data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;
    use tempfile::TempDir;

    #[test]
    fn test_descriptions_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("descriptions.json");
        let mut descriptions = vec![
            Description::regular(0.0, 2000.0, "Rain on the window"),
            Description::extended(2500.0, "A letter on the table"),
        ];
        descriptions[1].index = 1;

        write_descriptions(&path, &descriptions).unwrap();
        assert_eq!(read_descriptions(&path).unwrap(), descriptions);
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spaces.json");

        write_spaces(&path, &[Space::new(0.0, 1000.0), Space::new(2000.0, 4000.0)]).unwrap();
        write_spaces(&path, &[]).unwrap();

        assert!(read_spaces(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_corrupt_files_are_distinct() {
        let dir = TempDir::new().unwrap();
        let spaces = dir.path().join("spaces.json");
        let descriptor = dir.path().join("demo.proj");

        assert!(matches!(read_spaces(&spaces), Err(ProjectError::FileMissing(_))));
        assert!(matches!(
            read_descriptor(&descriptor),
            Err(ProjectError::DescriptorMissing(_))
        ));

        fs::write(&spaces, "[{").unwrap();
        fs::write(&descriptor, "{}").unwrap();
        assert!(matches!(read_spaces(&spaces), Err(ProjectError::FileCorrupt { .. })));
        assert!(matches!(
            read_descriptor(&descriptor),
            Err(ProjectError::DescriptorCorrupt { .. })
        ));
    }

    #[test]
    fn test_descriptor_round_trip() {
        let dir = TempDir::new().unwrap();
        let project = Project::new("demo", dir.path(), std::path::Path::new("demo.mp4"));
        let descriptor = project.descriptor();

        write_descriptor(&project.paths.descriptor_file, &descriptor).unwrap();
        assert_eq!(
            read_descriptor(&project.paths.descriptor_file).unwrap(),
            descriptor
        );
    }
}
