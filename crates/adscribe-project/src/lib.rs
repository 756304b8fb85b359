//! Project lifecycle for adscribe
//!
//! Creates, loads, saves and closes audio-description projects. Loading a
//! project derives the video's waveform in the background the first time
//! and reuses the cached copy afterwards.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod persistence;
pub mod project;

pub use config::ProjectConfig;
pub use controller::{OverwriteConfirmation, ProjectController};
pub use error::ProjectError;
pub use events::{LoadState, ProjectEvent};
pub use project::{NewProject, Project, ProjectDescriptor};
