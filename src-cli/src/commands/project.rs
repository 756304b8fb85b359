//! Project commands

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use adscribe_core::Space;
use adscribe_project::{persistence, NewProject, OverwriteConfirmation, Project, ProjectError};
use adscribe_waveform::cache;
use anyhow::{Context, Result};
use tracing::info;

use crate::state::AppState;

/// Asks on stdin unless `--force` was given
pub struct PromptConfirmation {
    pub force: bool,
}

impl OverwriteConfirmation for PromptConfirmation {
    fn confirm_overwrite(&self, folder: &Path) -> bool {
        if self.force {
            return true;
        }
        eprint!("{} already exists. Overwrite it? [y/N] ", folder.display());
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Create a project, then load it so the waveform gets extracted
pub async fn create_project(
    state: &mut AppState,
    name: String,
    folder: PathBuf,
    video: PathBuf,
    copy_video: bool,
    force: bool,
) -> Result<()> {
    let new_project = NewProject {
        name,
        folder: absolute(&folder)?,
        video_file: absolute(&video)?,
        copy_video,
    };

    let project = match state
        .controller
        .create_project(new_project, &PromptConfirmation { force })
    {
        Ok(project) => project,
        Err(e) if e.is_cancelled() => {
            println!("Cancelled");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to create project"),
    };

    println!("Created {}", project.paths.descriptor_file.display());
    let config = state.project_config();
    let project = state.controller.load(project, &config).await?;
    print_summary(state, &project);
    state.controller.close_project();
    Ok(())
}

/// Load a project, extracting its waveform when the cache is empty
pub async fn load_project(state: &mut AppState, descriptor: &Path) -> Result<()> {
    let project = load(state, descriptor).await?;
    print_summary(state, &project);
    state.controller.close_project();
    Ok(())
}

/// Load and write back every project file
pub async fn save_project(state: &mut AppState, descriptor: &Path) -> Result<()> {
    load(state, descriptor).await?;
    state.controller.save_project()?;
    println!("Saved {}", descriptor.display());
    state.controller.close_project();
    Ok(())
}

/// Show what is on disk without loading the waveform
pub fn project_info(descriptor: &Path) -> Result<()> {
    let content = persistence::read_descriptor(descriptor)?;
    let project = Project::from_descriptor(descriptor, content.clone())?;

    let descriptions = persistence::read_descriptions(&project.paths.descriptions_file)
        .or_else(empty_when_missing)?;
    let spaces = persistence::read_spaces(&project.paths.spaces_file).or_else(empty_when_missing)?;
    let extended = descriptions.iter().filter(|d| d.is_extended).count();

    println!("Name:          {}", content.name);
    println!("Folder:        {}", project.folder().display());
    println!("Video:         {}", project.video_file.display());
    println!("Created:       {}", content.created_at.to_rfc3339());
    println!("Modified:      {}", content.modified_at.to_rfc3339());
    println!(
        "Descriptions:  {} ({} regular, {} extended)",
        descriptions.len(),
        descriptions.len() - extended,
        extended
    );
    println!("Spaces:        {}", spaces.len());
    println!(
        "Waveform:      {}",
        if cache::exists(
            &project.paths.waveform_header_file,
            &project.paths.waveform_data_file,
        ) {
            "cached"
        } else {
            "not extracted"
        }
    );
    Ok(())
}

/// Run silence detection again and print the spaces it adds
pub async fn analyze_spaces(state: &mut AppState, descriptor: &Path, save: bool) -> Result<()> {
    // Detection runs explicitly below
    let mut config = state.project_config();
    config.auto_generate_spaces = false;
    let project = state
        .controller
        .load_project(&absolute(descriptor)?, &config)
        .await?;

    let spaces = state.controller.analyze_spaces().await?;
    info!("Found {} spaces in {}", spaces.len(), project.name);
    for space in &spaces {
        println!("{}", format_space(space));
    }

    if save {
        state.controller.save_project()?;
        println!("Saved {} spaces", state.controller.model().spaces().len());
    }
    state.controller.close_project();
    Ok(())
}

async fn load(state: &mut AppState, descriptor: &Path) -> Result<Project> {
    let config = state.project_config();
    let descriptor = absolute(descriptor)?;
    Ok(state.controller.load_project(&descriptor, &config).await?)
}

fn print_summary(state: &AppState, project: &Project) {
    let model = state.controller.model();
    println!("Project:       {}", project.name);
    if let Some(waveform) = &project.waveform {
        println!("Duration:      {}", format_ms(waveform.duration_ms()));
    }
    println!(
        "Descriptions:  {} ({} regular, {} extended)",
        model.all_descriptions().len(),
        model.regular_descriptions().len(),
        model.extended_descriptions().len()
    );
    println!("Spaces:        {}", model.spaces().len());
}

fn empty_when_missing<T>(err: ProjectError) -> Result<Vec<T>, ProjectError> {
    match err {
        ProjectError::FileMissing(_) => Ok(Vec::new()),
        other => Err(other),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(cwd.join(path))
}

fn format_space(space: &Space) -> String {
    format!(
        "#{:<3} {} - {} ({:.1}s)",
        space.index,
        format_ms(space.start_ms),
        format_ms(space.end_ms),
        space.duration_ms() / 1000.0
    )
}

/// `mm:ss.mmm`
fn format_ms(ms: f64) -> String {
    let total = ms.max(0.0).round() as u64;
    format!("{:02}:{:02}.{:03}", total / 60_000, (total / 1000) % 60, total % 1000)
}
