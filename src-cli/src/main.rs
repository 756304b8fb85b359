//! adscribe command line
//!
//! Creates and maintains audio-description projects for a video.

mod commands;
mod config;
mod progress;
mod state;

use std::path::PathBuf;

use adscribe_project::ProjectEvent;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use config::AppConfig;
use state::AppState;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a project for a video and extract its waveform
    Create {
        /// Project name
        name: String,
        /// Project folder
        folder: PathBuf,
        /// Source video
        video: PathBuf,
        /// Copy the video into the project folder
        #[arg(long)]
        copy_video: bool,
        /// Replace an existing folder without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Load a project, extracting the waveform if it is not cached
    Load {
        /// Project descriptor (`<name>.proj`)
        descriptor: PathBuf,
    },
    /// Load a project and write all of its files back
    Save {
        /// Project descriptor (`<name>.proj`)
        descriptor: PathBuf,
    },
    /// Show project contents without loading the waveform
    Info {
        /// Project descriptor (`<name>.proj`)
        descriptor: PathBuf,
    },
    /// Detect spaces in the project's waveform
    Spaces {
        /// Project descriptor (`<name>.proj`)
        descriptor: PathBuf,
        /// Save the detected spaces with the project
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match cli.config.or_else(AppConfig::default_path) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };
    debug!("Config: {:?}", config);

    let mut state = AppState::new(config);
    let mut events = state.controller.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ProjectEvent::OperationFailed { operation, message }) => {
                    warn!("{} failed: {}", operation, message)
                }
                Ok(event) => debug!("Event: {}", event_name(&event)),
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = match cli.command {
        Command::Create {
            name,
            folder,
            video,
            copy_video,
            force,
        } => commands::create_project(&mut state, name, folder, video, copy_video, force).await,
        Command::Load { descriptor } => commands::load_project(&mut state, &descriptor).await,
        Command::Save { descriptor } => commands::save_project(&mut state, &descriptor).await,
        Command::Info { descriptor } => commands::project_info(&descriptor),
        Command::Spaces { descriptor, save } => {
            commands::analyze_spaces(&mut state, &descriptor, save).await
        }
    };

    // Dropping the controller closes the event channel
    drop(state);
    listener.await.context("Event listener failed")?;
    result
}

fn event_name(event: &ProjectEvent) -> String {
    match event {
        ProjectEvent::LoadStateChanged(state) => format!("state {}", state),
        ProjectEvent::DescriptionsLoaded(d) => format!("{} descriptions loaded", d.len()),
        ProjectEvent::SpacesLoaded(s) => format!("{} spaces loaded", s.len()),
        ProjectEvent::SpacesAnalysisCompleted { spaces, .. } => {
            format!("{} spaces detected", spaces.len())
        }
        ProjectEvent::ProjectLoaded(project) => format!("{} loaded", project.name),
        ProjectEvent::ProjectSaved => "project saved".to_string(),
        ProjectEvent::ProjectClosed => "project closed".to_string(),
        ProjectEvent::OperationFailed { operation, .. } => format!("{} failed", operation),
    }
}
