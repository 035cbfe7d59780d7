// ABOUTME: Entry point for the agentdir binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and either serves the API or seeds the database.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdir_core::{Agent, AgentInput, IdPolicy};
use agentdir_server::{AgentdirConfig, AppState, AuthGate, create_router};
use agentdir_store::{AgentStore, sample_agents, seed};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// agentdir - a directory of internally built agents with a single-admin JSON API
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Socket address to bind (overrides AGENTDIR_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// SQLite database file (overrides AGENTDIR_DB)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Create the schema and insert sample agents that are not yet present
    Seed {
        /// SQLite database file (overrides AGENTDIR_DB)
        #[arg(long)]
        db: Option<PathBuf>,

        /// YAML file with a list of agents to insert instead of the built-in samples
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("agentdir=debug,tower_http=debug")),
        )
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db } => serve(bind, db).await,
        Commands::Seed { db, file } => {
            let db_path = db.unwrap_or_else(agentdir_server::database_path);
            let agents = match file {
                Some(path) => load_seed_file(&path)?,
                None => sample_agents(),
            };
            let store = open_store(&db_path)?;
            let inserted = seed(&store, &agents)
                .with_context(|| format!("failed to seed {}", db_path.display()))?;
            println!(
                "Seeded {} agent(s) into {} ({} already present)",
                inserted,
                db_path.display(),
                agents.len() - inserted
            );
            Ok(())
        }
    }
}

async fn serve(bind: Option<SocketAddr>, db: Option<PathBuf>) -> Result<()> {
    let mut config = AgentdirConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(db) = db {
        config.db_path = db;
    }
    tracing::debug!(?config, "loaded configuration");

    let store = open_store(&config.db_path)?;
    // Surface connectivity or permission problems at startup rather than on the first request.
    store
        .ensure_schema()
        .with_context(|| format!("failed to prepare {}", config.db_path.display()))?;

    let auth = AuthGate::new(&config.admin_password, config.production)
        .context("failed to hash the administrator password")?;
    let state = Arc::new(AppState::new(store, auth));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        db = %config.db_path.display(),
        production = config.production,
        "agentdir listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("agentdir shut down");
    Ok(())
}

fn open_store(db_path: &Path) -> Result<AgentStore> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    AgentStore::open(db_path).with_context(|| format!("failed to open {}", db_path.display()))
}

/// Read a YAML list of agents. Every entry must carry an id so repeated
/// seeding stays idempotent.
fn load_seed_file(path: &Path) -> Result<Vec<Agent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_seed_yaml(&text).with_context(|| format!("invalid seed file {}", path.display()))
}

fn parse_seed_yaml(text: &str) -> Result<Vec<Agent>> {
    let inputs: Vec<AgentInput> = serde_yaml::from_str(text)?;
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            input
                .validate(IdPolicy::Require)
                .with_context(|| format!("entry {}", i + 1))
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
