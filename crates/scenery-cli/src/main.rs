use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scenery_infrastructure::{ConfigService, SceneryPaths};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod app;
mod commands;
mod prompt;

#[derive(Parser)]
#[command(name = "scenery")]
#[command(about = "Scenery - inspect and maintain stored scenes, parties and participants", long_about = None)]
struct Cli {
    /// Directory holding the store file and scene blobs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stored scenes
    Scenes {
        #[command(subcommand)]
        action: SceneAction,
    },
    /// Party templates and per-box configs
    Party {
        #[command(subcommand)]
        action: PartyAction,
    },
    /// Human participants and the discussion topic
    Participants {
        #[command(subcommand)]
        action: ParticipantAction,
    },
}

#[derive(Subcommand)]
enum SceneAction {
    /// List stored scenes, newest first
    List,
    /// Print a scene as JSON
    Show { id: String },
    /// Remove duplicate records of the same scene
    CleanupDuplicates,
    /// Delete a scene and the party configs of its boxes
    Delete { id: String },
}

#[derive(Subcommand)]
enum PartyAction {
    /// List party templates
    List,
    /// Print the party-mode configuration of a scene
    Config { scene_id: String },
    /// Clear per-box party configs
    Cleanup {
        /// Run even when cleanup is disabled in the configuration
        #[arg(long)]
        force: bool,
        /// Keep the configs of boxes that still exist in a stored scene
        #[arg(long)]
        prune: bool,
    },
}

#[derive(Subcommand)]
enum ParticipantAction {
    /// Replace the list of human participants
    Humans { names: Vec<String> },
    /// Set the discussion topic
    Topic { text: String },
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut paths = SceneryPaths::platform()?;
    let config = ConfigService::load(&paths)?;
    init_logging(&config.config().logging.filter);

    if let Some(dir) = cli
        .data_dir
        .clone()
        .or_else(|| config.config().storage.data_dir.clone())
    {
        paths = paths.with_data_dir(dir);
    }

    let app = app::App::open(&paths, config.config(), cli.yes).await?;

    match cli.command {
        Commands::Scenes { action } => match action {
            SceneAction::List => commands::scenes::list(&app).await?,
            SceneAction::Show { id } => commands::scenes::show(&app, &id).await?,
            SceneAction::CleanupDuplicates => commands::scenes::cleanup_duplicates(&app).await?,
            SceneAction::Delete { id } => commands::scenes::delete(&app, &id).await?,
        },
        Commands::Party { action } => match action {
            PartyAction::List => commands::party::list(&app).await?,
            PartyAction::Config { scene_id } => commands::party::config(&app, &scene_id).await?,
            PartyAction::Cleanup { force, prune } => {
                commands::party::cleanup(&app, force, prune).await?
            }
        },
        Commands::Participants { action } => match action {
            ParticipantAction::Humans { names } => {
                commands::participants::humans(&app, names).await?
            }
            ParticipantAction::Topic { text } => commands::participants::topic(&app, text).await?,
        },
    }

    Ok(())
}
