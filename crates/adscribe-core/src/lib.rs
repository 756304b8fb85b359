//! adscribe-core - data model for audio-description projects
//!
//! Descriptions, spaces, the observable indexed collections that hold them
//! and the fixed on-disk layout of a project folder.

pub mod collection;
pub mod fs_utils;
pub mod model;
pub mod paths;
pub mod types;

pub use collection::{CollectionChange, IndexedCollection};
pub use model::ProjectModel;
pub use paths::ProjectPaths;
pub use types::*;
