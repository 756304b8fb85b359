//! Lifecycle notifications

use adscribe_core::{Description, Space};

use crate::project::Project;

/// Steps of a project load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    DirectoriesInitializing,
    MetadataLoading,
    WaveformResolving,
    WaveformLoadingFromCache,
    WaveformExtracting,
    Finalizing,
    Loaded,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadState::Idle => "idle",
            LoadState::DirectoriesInitializing => "initializing directories",
            LoadState::MetadataLoading => "loading metadata",
            LoadState::WaveformResolving => "resolving waveform",
            LoadState::WaveformLoadingFromCache => "loading cached waveform",
            LoadState::WaveformExtracting => "extracting waveform",
            LoadState::Finalizing => "finalizing",
            LoadState::Loaded => "loaded",
        };
        write!(f, "{}", name)
    }
}

/// Published by the [`ProjectController`](crate::ProjectController)
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    /// The load moved to another step
    LoadStateChanged(LoadState),
    /// Persisted descriptions are in the model
    DescriptionsLoaded(Vec<Description>),
    /// Persisted spaces are in the model
    SpacesLoaded(Vec<Space>),
    /// Silence detection finished. `project` is set when it ran as part of a load.
    SpacesAnalysisCompleted {
        spaces: Vec<Space>,
        project: Option<Project>,
    },
    /// Metadata and waveform are attached
    ProjectLoaded(Project),
    ProjectSaved,
    ProjectClosed,
    /// A lifecycle operation failed; the error is also returned to the caller
    OperationFailed {
        operation: &'static str,
        message: String,
    },
}
