//! Project lifecycle controller
//!
//! Owns the live [`ProjectModel`] and the current [`Project`]. Loading runs
//! the state machine described by [`LoadState`]; the expensive waveform
//! extraction runs on a blocking worker and the continuation resumes on the
//! task that drives the controller, so the model is only ever touched from
//! one place.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adscribe_core::{Description, ProjectModel, Space};
use adscribe_waveform::{
    cache, AudioExtractor, LoadingProgress, ProgressSink, SilenceDetector, SpaceDetector,
    SymphoniaExtractor, Waveform,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::config::ProjectConfig;
use crate::error::ProjectError;
use crate::events::{LoadState, ProjectEvent};
use crate::persistence;
use crate::project::{NewProject, Project};

/// Capacity of the lifecycle event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Asks the user whether an existing project folder may be replaced
pub trait OverwriteConfirmation {
    fn confirm_overwrite(&self, folder: &Path) -> bool;
}

impl<F> OverwriteConfirmation for F
where
    F: Fn(&Path) -> bool,
{
    fn confirm_overwrite(&self, folder: &Path) -> bool {
        self(folder)
    }
}

/// Drives project creation, load, save and close
pub struct ProjectController {
    extractor: Arc<dyn AudioExtractor>,
    detector: Arc<dyn SpaceDetector>,
    progress: Arc<dyn ProgressSink>,
    events: broadcast::Sender<ProjectEvent>,
    model: ProjectModel,
    project: Option<Project>,
    working_directory: Option<PathBuf>,
    state: LoadState,
}

impl ProjectController {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        detector: Arc<dyn SpaceDetector>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            extractor,
            detector,
            progress,
            events,
            model: ProjectModel::new(),
            project: None,
            working_directory: None,
            state: LoadState::Idle,
        }
    }

    /// Subscribe to lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.events.subscribe()
    }

    pub fn model(&self) -> &ProjectModel {
        &self.model
    }

    /// Interactive authoring goes through here
    pub fn model_mut(&mut self) -> &mut ProjectModel {
        &mut self.model
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Folder of the last loaded project
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn progress(&self) -> &Arc<dyn ProgressSink> {
        &self.progress
    }

    /// Create the folder structure of a brand-new project.
    ///
    /// Relative folders are rejected before the file system is touched. An
    /// existing folder is only replaced when `confirm` agrees.
    pub fn initialize_project_directory(
        &self,
        project: &Project,
        confirm: &dyn OverwriteConfirmation,
    ) -> Result<(), ProjectError> {
        let folder = project.folder();
        if !folder.is_absolute() {
            let err = ProjectError::NotRooted(folder.to_path_buf());
            self.report("initialize project directory", &err);
            return Err(err);
        }

        if folder.exists() {
            if !confirm.confirm_overwrite(folder) {
                info!("Overwrite of {} declined", folder.display());
                return Err(ProjectError::Cancelled);
            }
            info!("Replacing existing folder {}", folder.display());
            if let Err(e) = fs::remove_dir_all(folder) {
                let err = ProjectError::from(e);
                self.report("initialize project directory", &err);
                return Err(err);
            }
        }

        let result = create_project_files(project);
        if let Err(err) = &result {
            self.report("initialize project directory", err);
        } else {
            info!("Initialized project {} in {}", project.name, folder.display());
        }
        result
    }

    /// Build and initialize a new project, optionally copying its video in
    pub fn create_project(
        &self,
        new_project: NewProject,
        confirm: &dyn OverwriteConfirmation,
    ) -> Result<Project, ProjectError> {
        let source_video = new_project.video_file;
        let copied_name = source_video
            .file_name()
            .filter(|_| new_project.copy_video)
            .map(|name| new_project.folder.join(name));
        let project = Project::new(
            &new_project.name,
            &new_project.folder,
            copied_name.as_deref().unwrap_or(&source_video),
        );

        self.initialize_project_directory(&project, confirm)?;

        if copied_name.is_some() {
            info!("Copying video into {}", project.folder().display());
            if let Err(e) = fs::copy(&source_video, &project.video_file) {
                let err = ProjectError::from(e);
                self.report("copy video", &err);
                return Err(err);
            }
        }
        Ok(project)
    }

    /// Load the project described by `descriptor_file`
    pub async fn load_project(
        &mut self,
        descriptor_file: &Path,
        config: &ProjectConfig,
    ) -> Result<Project, ProjectError> {
        let project = persistence::read_descriptor(descriptor_file)
            .and_then(|descriptor| Project::from_descriptor(descriptor_file, descriptor));
        match project {
            Ok(project) => self.load(project, config).await,
            Err(err) => {
                self.report("load project", &err);
                Err(err)
            }
        }
    }

    /// Load an already-built project, replacing the current one
    pub async fn load(
        &mut self,
        project: Project,
        config: &ProjectConfig,
    ) -> Result<Project, ProjectError> {
        self.model.clear();
        self.project = None;

        let result = self.run_load(project, config).await;
        if let Err(err) = &result {
            self.report("load project", err);
            self.model.clear();
            self.working_directory = None;
            self.progress.set_visible(false);
            self.state = LoadState::Idle;
        }
        result
    }

    async fn run_load(
        &mut self,
        mut project: Project,
        config: &ProjectConfig,
    ) -> Result<Project, ProjectError> {
        info!("Loading project {} from {}", project.name, project.folder().display());

        self.transition(LoadState::DirectoriesInitializing);
        fs::create_dir_all(&project.paths.descriptions_folder)?;
        fs::create_dir_all(&project.paths.cache_folder)?;

        self.transition(LoadState::MetadataLoading);
        let descriptions = or_empty(persistence::read_descriptions(
            &project.paths.descriptions_file,
        ))?;
        let spaces = or_empty(persistence::read_spaces(&project.paths.spaces_file))?;

        self.model.set_descriptions(descriptions);
        self.publish(ProjectEvent::DescriptionsLoaded(
            self.model.all_descriptions().to_vec(),
        ));
        self.model.set_spaces(spaces);
        self.publish(ProjectEvent::SpacesLoaded(self.model.spaces().to_vec()));

        self.transition(LoadState::WaveformResolving);
        let waveform = if cache::exists(
            &project.paths.waveform_header_file,
            &project.paths.waveform_data_file,
        ) {
            self.transition(LoadState::WaveformLoadingFromCache);
            Arc::new(persistence::read_waveform(&project.paths)?)
        } else {
            self.transition(LoadState::WaveformExtracting);
            self.extract_waveform(&project, config).await?
        };
        project.waveform = Some(waveform);

        self.transition(LoadState::Finalizing);
        self.working_directory = Some(project.folder().to_path_buf());
        self.project = Some(project.clone());
        self.publish(ProjectEvent::ProjectLoaded(project.clone()));
        self.progress.set_visible(false);

        self.transition(LoadState::Loaded);
        info!("Project {} loaded", project.name);
        Ok(project)
    }

    async fn extract_waveform(
        &mut self,
        project: &Project,
        config: &ProjectConfig,
    ) -> Result<Arc<Waveform>, ProjectError> {
        self.progress.set_visible(true);
        self.progress.set_progress("Importing video", 0.0);

        let extractor = self.extractor.clone();
        let detector = self.detector.clone();
        let progress = self.progress.clone();
        let video = project.video_file.clone();
        let auto_generate_spaces = config.auto_generate_spaces;

        let (waveform, detected) = tokio::task::spawn_blocking(move || {
            let waveform = extractor.extract(&video, progress.as_ref())?;
            let detected = if auto_generate_spaces {
                progress.set_progress("Detecting spaces", 100.0);
                Some(detector.detect(&waveform))
            } else {
                None
            };
            Ok::<_, ProjectError>((waveform, detected))
        })
        .await
        .map_err(|e| ProjectError::TaskFailed(e.to_string()))??;

        if let Some(detected) = detected {
            let spaces = self.append_spaces(detected);
            self.publish(ProjectEvent::SpacesAnalysisCompleted {
                spaces,
                project: Some(project.clone()),
            });
        }

        let waveform = Arc::new(waveform);
        let to_store = waveform.clone();
        let paths = project.paths.clone();
        tokio::task::spawn_blocking(move || persistence::write_waveform(&paths, &to_store))
            .await
            .map_err(|e| ProjectError::TaskFailed(e.to_string()))??;

        Ok(waveform)
    }

    /// Re-run silence detection on the loaded waveform.
    ///
    /// Detected windows that overlap an existing space are dropped, so running
    /// it repeatedly does not duplicate spaces. Returns the spaces added.
    pub async fn analyze_spaces(&mut self) -> Result<Vec<Space>, ProjectError> {
        let project = self.project.as_ref().ok_or(ProjectError::NoProjectLoaded)?;
        let waveform = project.waveform.clone().ok_or(ProjectError::NoWaveform)?;
        let detector = self.detector.clone();

        let detected = tokio::task::spawn_blocking(move || detector.detect(&waveform))
            .await
            .map_err(|e| ProjectError::TaskFailed(e.to_string()))?;

        let spaces = self.append_spaces(detected);
        self.publish(ProjectEvent::SpacesAnalysisCompleted {
            spaces: spaces.clone(),
            project: None,
        });
        Ok(spaces)
    }

    /// Write descriptor, waveform, descriptions and spaces
    pub fn save_project(&self) -> Result<(), ProjectError> {
        let project = self.project.as_ref().ok_or(ProjectError::NoProjectLoaded)?;

        let result = write_project(
            project,
            self.model.all_descriptions().as_slice(),
            self.model.spaces().as_slice(),
        );
        match &result {
            Ok(()) => {
                info!("Project {} saved", project.name);
                self.publish(ProjectEvent::ProjectSaved);
            }
            Err(err) => self.report("save project", err),
        }
        result
    }

    /// Drop the current project and empty the model
    pub fn close_project(&mut self) {
        self.model.clear();
        if let Some(project) = self.project.take() {
            info!("Project {} closed", project.name);
        }
        self.state = LoadState::Idle;
        self.publish(ProjectEvent::ProjectClosed);
    }

    fn append_spaces(&mut self, detected: Vec<Space>) -> Vec<Space> {
        let found = detected.len();
        let added = self.model.merge_spaces(detected);
        if added.len() < found {
            debug!("Skipped {} detected spaces overlapping existing ones", found - added.len());
        }
        added
    }

    fn transition(&mut self, state: LoadState) {
        debug!("Load state: {} -> {}", self.state, state);
        self.state = state;
        self.publish(ProjectEvent::LoadStateChanged(state));
    }

    fn publish(&self, event: ProjectEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn report(&self, operation: &'static str, err: &ProjectError) {
        error!("Failed to {}: {}", operation, err);
        self.publish(ProjectEvent::OperationFailed {
            operation,
            message: err.to_string(),
        });
    }
}

impl Default for ProjectController {
    fn default() -> Self {
        Self::new(
            Arc::new(SymphoniaExtractor::default()),
            Arc::new(SilenceDetector::default()),
            Arc::new(LoadingProgress::new()),
        )
    }
}

fn create_project_files(project: &Project) -> Result<(), ProjectError> {
    fs::create_dir_all(project.folder())?;
    persistence::write_descriptor(&project.paths.descriptor_file, &project.descriptor())?;
    persistence::write_descriptions(&project.paths.descriptions_file, &[])?;
    persistence::write_spaces(&project.paths.spaces_file, &[])?;
    Ok(())
}

fn write_project(
    project: &Project,
    descriptions: &[Description],
    spaces: &[Space],
) -> Result<(), ProjectError> {
    persistence::write_descriptor(&project.paths.descriptor_file, &project.descriptor())?;
    if let Some(waveform) = &project.waveform {
        persistence::write_waveform(&project.paths, waveform)?;
    }
    persistence::write_descriptions(&project.paths.descriptions_file, descriptions)?;
    persistence::write_spaces(&project.paths.spaces_file, spaces)?;
    Ok(())
}

/// Absent descriptions or spaces files load as empty lists
fn or_empty<T>(result: Result<Vec<T>, ProjectError>) -> Result<Vec<T>, ProjectError> {
    match result {
        Err(ProjectError::FileMissing(path)) => {
            debug!("{} not found, starting empty", path.display());
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use adscribe_core::Description;
    use adscribe_waveform::{NoProgress, WaveformError, WaveformHeader};
    use tempfile::TempDir;

    /// 100 peaks per second for `duration_ms`
    fn test_waveform(duration_ms: usize) -> Waveform {
        let data = (0..duration_ms / 10).map(|i| (i % 200) as i16 * 100).collect();
        Waveform::new(WaveformHeader::mono_16bit(44100, 441), data).unwrap()
    }

    struct CountingExtractor {
        calls: AtomicUsize,
        waveform: Waveform,
    }

    impl CountingExtractor {
        fn new(duration_ms: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                waveform: test_waveform(duration_ms),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AudioExtractor for CountingExtractor {
        fn extract(
            &self,
            _video: &Path,
            progress: &dyn ProgressSink,
        ) -> Result<Waveform, WaveformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            progress.set_progress("Extracting audio", 50.0);
            progress.set_progress("Audio extracted", 100.0);
            Ok(self.waveform.clone())
        }
    }

    struct FailingExtractor;

    impl AudioExtractor for FailingExtractor {
        fn extract(&self, video: &Path, _: &dyn ProgressSink) -> Result<Waveform, WaveformError> {
            Err(WaveformError::FileNotFound(video.to_path_buf()))
        }
    }

    struct FixedDetector(Vec<(f64, f64)>);

    impl SpaceDetector for FixedDetector {
        fn detect(&self, _waveform: &Waveform) -> Vec<Space> {
            self.0
                .iter()
                .map(|(start, end)| Space::new(*start, *end))
                .collect()
        }
    }

    fn controller_with(
        extractor: Arc<dyn AudioExtractor>,
        progress: Arc<LoadingProgress>,
    ) -> ProjectController {
        let detector = Arc::new(FixedDetector(vec![
            (1000.0, 4000.0),
            (30_000.0, 33_000.0),
            (90_000.0, 95_000.0),
        ]));
        ProjectController::new(extractor, detector, progress)
    }

    fn new_project(dir: &TempDir) -> NewProject {
        NewProject {
            name: "Proj".to_string(),
            folder: dir.path().join("Proj"),
            video_file: dir.path().join("movie.mp4"),
            copy_video: false,
        }
    }

    fn never(_: &Path) -> bool {
        panic!("confirmation must not be requested")
    }

    fn drain(events: &mut broadcast::Receiver<ProjectEvent>) -> Vec<ProjectEvent> {
        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        received
    }

    fn states(events: &[ProjectEvent]) -> Vec<LoadState> {
        events
            .iter()
            .filter_map(|event| match event {
                ProjectEvent::LoadStateChanged(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_relative_folder_rejected_before_touching_disk() {
        let controller = ProjectController::new(
            CountingExtractor::new(1000),
            Arc::new(SilenceDetector::default()),
            Arc::new(NoProgress),
        );
        let project = Project::new(
            "rel",
            Path::new("adscribe-relative-test/rel"),
            Path::new("movie.mp4"),
        );

        let result = controller.initialize_project_directory(&project, &never);

        assert!(matches!(result, Err(ProjectError::NotRooted(_))));
        assert!(!Path::new("adscribe-relative-test").exists());
    }

    #[test]
    fn test_declined_overwrite_leaves_folder_unchanged() {
        let dir = TempDir::new().unwrap();
        let controller = ProjectController::default();
        let project = Project::new("Proj", &dir.path().join("Proj"), Path::new("movie.mp4"));
        fs::create_dir_all(project.folder()).unwrap();
        fs::write(project.folder().join("notes.txt"), b"keep me").unwrap();

        let result = controller.initialize_project_directory(&project, &|_: &Path| false);

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(fs::read(project.folder().join("notes.txt")).unwrap(), b"keep me");
        let entries = fs::read_dir(project.folder()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_accepted_overwrite_recreates_folder() {
        let dir = TempDir::new().unwrap();
        let controller = ProjectController::default();
        let project = Project::new("Proj", &dir.path().join("Proj"), Path::new("movie.mp4"));
        fs::create_dir_all(project.folder()).unwrap();
        fs::write(project.folder().join("notes.txt"), b"old").unwrap();

        controller
            .initialize_project_directory(&project, &|_: &Path| true)
            .unwrap();

        assert!(!project.folder().join("notes.txt").exists());
        assert!(project.paths.descriptor_file.is_file());
        assert!(persistence::read_descriptions(&project.paths.descriptions_file)
            .unwrap()
            .is_empty());
        assert!(persistence::read_spaces(&project.paths.spaces_file)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_create_project_copies_video() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("movie.mp4"), b"video bytes").unwrap();
        let controller = ProjectController::default();

        let project = controller
            .create_project(
                NewProject {
                    copy_video: true,
                    ..new_project(&dir)
                },
                &never,
            )
            .unwrap();

        assert_eq!(project.video_file, dir.path().join("Proj").join("movie.mp4"));
        assert_eq!(fs::read(&project.video_file).unwrap(), b"video bytes");
        let descriptor = persistence::read_descriptor(&project.paths.descriptor_file).unwrap();
        assert_eq!(descriptor.video_file, PathBuf::from("movie.mp4"));
    }

    #[tokio::test]
    async fn test_load_missing_descriptor_fails() {
        let dir = TempDir::new().unwrap();
        let mut controller = ProjectController::default();
        let mut events = controller.subscribe();

        let result = controller
            .load_project(&dir.path().join("nothing.proj"), &ProjectConfig::default())
            .await;

        assert!(matches!(result, Err(ProjectError::DescriptorMissing(_))));
        assert!(drain(&mut events)
            .iter()
            .any(|event| matches!(event, ProjectEvent::OperationFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_without_cache_extracts_and_detects() {
        let dir = TempDir::new().unwrap();
        let extractor = CountingExtractor::new(120_000);
        let progress = Arc::new(LoadingProgress::new());
        let mut controller = controller_with(extractor.clone(), progress.clone());
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        let mut events = controller.subscribe();

        let loaded = controller
            .load_project(&project.paths.descriptor_file, &ProjectConfig::default())
            .await
            .unwrap();

        assert_eq!(extractor.calls(), 1);
        let waveform = loaded.waveform.as_ref().unwrap();
        assert_eq!(waveform.duration_ms(), 120_000.0);
        assert_eq!(waveform.header().sample_rate, 44100);
        assert!(project.paths.waveform_header_file.is_file());
        assert!(project.paths.waveform_data_file.is_file());
        assert!(project.paths.descriptions_folder.is_dir());
        assert_eq!(controller.model().spaces().len(), 3);
        assert_eq!(controller.state(), LoadState::Loaded);
        assert_eq!(controller.working_directory(), Some(project.folder()));
        assert!(!progress.snapshot().visible);

        let events = drain(&mut events);
        assert_eq!(
            states(&events),
            vec![
                LoadState::DirectoriesInitializing,
                LoadState::MetadataLoading,
                LoadState::WaveformResolving,
                LoadState::WaveformExtracting,
                LoadState::Finalizing,
                LoadState::Loaded,
            ]
        );

        let position = |predicate: fn(&ProjectEvent) -> bool| {
            events.iter().position(|event| predicate(event)).unwrap()
        };
        let descriptions_loaded =
            position(|e| matches!(e, ProjectEvent::DescriptionsLoaded(d) if d.is_empty()));
        let spaces_loaded = position(|e| matches!(e, ProjectEvent::SpacesLoaded(s) if s.is_empty()));
        let resolving =
            position(|e| matches!(e, ProjectEvent::LoadStateChanged(LoadState::WaveformResolving)));
        let analysis = position(|e| {
            matches!(e, ProjectEvent::SpacesAnalysisCompleted { spaces, project: Some(_) } if spaces.len() == 3)
        });
        let project_loaded = position(|e| matches!(e, ProjectEvent::ProjectLoaded(p) if p.has_waveform()));
        assert!(descriptions_loaded < resolving);
        assert!(spaces_loaded < resolving);
        assert!(resolving < analysis);
        assert!(analysis < project_loaded);
    }

    #[tokio::test]
    async fn test_load_without_auto_generation_skips_detection() {
        let dir = TempDir::new().unwrap();
        let mut controller =
            controller_with(CountingExtractor::new(10_000), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        let mut events = controller.subscribe();

        controller
            .load(
                project,
                &ProjectConfig {
                    auto_generate_spaces: false,
                },
            )
            .await
            .unwrap();

        assert!(controller.model().spaces().is_empty());
        assert!(!drain(&mut events)
            .iter()
            .any(|event| matches!(event, ProjectEvent::SpacesAnalysisCompleted { .. })));
    }

    #[tokio::test]
    async fn test_save_then_load_uses_cache() {
        let dir = TempDir::new().unwrap();
        let first_extractor = CountingExtractor::new(120_000);
        let mut controller =
            controller_with(first_extractor.clone(), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        let loaded = controller
            .load_project(&project.paths.descriptor_file, &ProjectConfig::default())
            .await
            .unwrap();

        let model = controller.model_mut();
        model.add_description(Description::regular(1000.0, 3500.0, "A car pulls up"));
        model.add_description(Description::extended(31_000.0, "The sign reads CLOSED"));
        model.add_description(Description::regular(90_500.0, 94_000.0, "Rain begins"));
        let first_space = model.spaces().get(0).unwrap().id;
        model.remove_space(first_space);

        let mut events = controller.subscribe();
        controller.save_project().unwrap();
        assert!(matches!(
            drain(&mut events).as_slice(),
            [ProjectEvent::ProjectSaved]
        ));

        let saved_descriptions = controller.model().all_descriptions().to_vec();
        let saved_spaces = controller.model().spaces().to_vec();
        controller.close_project();
        assert!(controller.model().all_descriptions().is_empty());
        assert!(controller.model().spaces().is_empty());
        assert!(controller.project().is_none());

        let second_extractor = CountingExtractor::new(5_000);
        let mut reopened =
            controller_with(second_extractor.clone(), Arc::new(LoadingProgress::new()));
        let mut events = reopened.subscribe();
        let reloaded = reopened
            .load_project(&project.paths.descriptor_file, &ProjectConfig::default())
            .await
            .unwrap();

        assert_eq!(second_extractor.calls(), 0);
        assert!(states(&drain(&mut events)).contains(&LoadState::WaveformLoadingFromCache));
        assert_eq!(reopened.model().all_descriptions().to_vec(), saved_descriptions);
        assert_eq!(reopened.model().spaces().to_vec(), saved_spaces);
        assert_eq!(reopened.model().regular_descriptions().len(), 2);
        assert_eq!(reopened.model().extended_descriptions().len(), 1);
        assert_eq!(
            reloaded.waveform.as_deref(),
            loaded.waveform.as_deref()
        );
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_no_cache() {
        let dir = TempDir::new().unwrap();
        let progress = Arc::new(LoadingProgress::new());
        let mut controller = controller_with(Arc::new(FailingExtractor), progress.clone());
        let project = controller.create_project(new_project(&dir), &never).unwrap();

        let result = controller.load(project.clone(), &ProjectConfig::default()).await;

        assert!(matches!(result, Err(ProjectError::Waveform(_))));
        assert!(!project.paths.waveform_data_file.exists());
        assert!(!project.paths.waveform_header_file.exists());
        assert!(controller.project().is_none());
        assert_eq!(controller.state(), LoadState::Idle);
        assert!(!progress.snapshot().visible);
    }

    #[tokio::test]
    async fn test_analyze_spaces_appends_without_project_payload() {
        let dir = TempDir::new().unwrap();
        let mut controller =
            controller_with(CountingExtractor::new(120_000), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        controller
            .load(
                project,
                &ProjectConfig {
                    auto_generate_spaces: false,
                },
            )
            .await
            .unwrap();
        let mut events = controller.subscribe();

        let spaces = controller.analyze_spaces().await.unwrap();

        assert_eq!(spaces.len(), 3);
        assert_eq!(spaces[2].index, 2);
        assert!(matches!(
            drain(&mut events).as_slice(),
            [ProjectEvent::SpacesAnalysisCompleted { project: None, .. }]
        ));
    }

    #[tokio::test]
    async fn test_save_and_analyze_need_a_project() {
        let mut controller = ProjectController::default();
        assert!(matches!(
            controller.save_project(),
            Err(ProjectError::NoProjectLoaded)
        ));
        assert!(matches!(
            controller.analyze_spaces().await,
            Err(ProjectError::NoProjectLoaded)
        ));
    }

    #[tokio::test]
    async fn test_failed_load_discards_loaded_metadata() {
        let dir = TempDir::new().unwrap();
        let mut controller =
            controller_with(Arc::new(FailingExtractor), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        persistence::write_descriptions(
            &project.paths.descriptions_file,
            &[Description::regular(0.0, 2000.0, "A door opens")],
        )
        .unwrap();
        persistence::write_spaces(&project.paths.spaces_file, &[Space::new(500.0, 2500.0)])
            .unwrap();

        let result = controller.load(project, &ProjectConfig::default()).await;

        assert!(result.is_err());
        assert!(controller.project().is_none());
        assert!(controller.working_directory().is_none());
        assert!(controller.model().all_descriptions().is_empty());
        assert!(controller.model().regular_descriptions().is_empty());
        assert!(controller.model().spaces().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_analysis_does_not_duplicate_spaces() {
        let dir = TempDir::new().unwrap();
        let mut controller =
            controller_with(CountingExtractor::new(120_000), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        controller
            .load(project, &ProjectConfig::default())
            .await
            .unwrap();
        assert_eq!(controller.model().spaces().len(), 3);

        controller.model_mut().add_space(Space::new(50_000.0, 52_000.0));
        let first = controller.analyze_spaces().await.unwrap();
        let second = controller.analyze_spaces().await.unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        let spaces = controller.model().spaces().to_vec();
        assert_eq!(spaces.len(), 4);
        for pair in spaces.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
        }
        for (position, space) in spaces.iter().enumerate() {
            assert_eq!(space.index, position);
        }
        assert_eq!(spaces[2].start_ms, 50_000.0);
    }

    #[tokio::test]
    async fn test_header_without_data_is_re_extracted() {
        let dir = TempDir::new().unwrap();
        let extractor = CountingExtractor::new(10_000);
        let mut controller = controller_with(extractor.clone(), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        fs::create_dir_all(&project.paths.cache_folder).unwrap();
        cache::write_header(
            &project.paths.waveform_header_file,
            &WaveformHeader::mono_16bit(48000, 480),
        )
        .unwrap();

        let loaded = controller
            .load(project.clone(), &ProjectConfig::default())
            .await
            .unwrap();

        assert_eq!(extractor.calls(), 1);
        assert!(project.paths.waveform_header_file.is_file());
        assert!(project.paths.waveform_data_file.is_file());
        let cached = persistence::read_waveform(&project.paths).unwrap();
        assert_eq!(Some(&cached), loaded.waveform.as_deref());
        assert_eq!(cached.header().sample_rate, 44100);
    }

    #[tokio::test]
    async fn test_data_without_header_is_re_extracted() {
        let dir = TempDir::new().unwrap();
        let extractor = CountingExtractor::new(10_000);
        let mut controller = controller_with(extractor.clone(), Arc::new(LoadingProgress::new()));
        let project = controller.create_project(new_project(&dir), &never).unwrap();
        fs::create_dir_all(&project.paths.cache_folder).unwrap();
        cache::write_data(&project.paths.waveform_data_file, &[1, 2, 3]).unwrap();

        let loaded = controller
            .load(project.clone(), &ProjectConfig::default())
            .await
            .unwrap();

        assert_eq!(extractor.calls(), 1);
        assert!(project.paths.waveform_header_file.is_file());
        let cached = persistence::read_waveform(&project.paths).unwrap();
        assert_eq!(cached.len(), 1000);
        assert_eq!(Some(&cached), loaded.waveform.as_deref());
    }
}
