//! csync-cut - competition cut service
//!
//! Serves the song/job HTTP API by default. The `analyze` and `generate`
//! subcommands run one job against the configured record store and exit.

use anyhow::Result;
use clap::{Parser, Subcommand};
use csync_common::config::{RootFolderInitializer, RootFolderResolver};
use csync_common::events::EventBus;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use csync_cut::config::CutServiceConfig;
use csync_cut::workflow::{run_analysis, run_cut, JobContext};
use csync_cut::AppState;

#[derive(Debug, Parser)]
#[command(name = "csync-cut", version, about = "ChoreoSync competition cut service")]
struct Cli {
    /// Config file (default: $CSYNC_CONFIG, then ~/.config/csync/csync-cut.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root folder holding the database and local objects
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Analyze one song and print the analysis
    Analyze { song_id: Uuid },
    /// Generate the cut of one song and print its metadata
    Generate { song_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CutServiceConfig::load(cli.config.as_deref())?;

    // RUST_LOG wins over the config file level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting csync-cut (competition cuts)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve root folder
    let resolver = RootFolderResolver::new(cli.root_folder.clone(), config.root_folder.clone());
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    // Step 2: Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = csync_common::db::init_database(&db_path).await?;

    // Step 3: Collaborators
    let event_bus = EventBus::new(100);
    let jobs = JobContext::from_config(
        &config,
        &initializer.objects_path(),
        db_pool,
        event_bus.clone(),
    )?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Analyze { song_id } => {
            let analysis = run_analysis(&jobs, song_id).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::Generate { song_id } => {
            let metadata = run_cut(&jobs, song_id).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Serve => {
            let port = cli.port.unwrap_or(config.port);
            let app = csync_cut::build_router(AppState::new(jobs, event_bus));

            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            info!("Listening on http://127.0.0.1:{}", port);
            info!("Health check: http://127.0.0.1:{}/health", port);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
