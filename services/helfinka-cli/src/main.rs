//! Helfinka CLI
//!
//! Command-line front end for the Helfinka health diary.

mod commands;
mod config;

use std::sync::Arc;

use clap::Parser;
use helfinka_client::HttpClient;
use helfinka_session::{FileStore, KeyValueStore, NoteTagHistory, SessionManager, ThemePreference};
use tracing_subscriber::EnvFilter;

use crate::commands::{App, Cli};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(base_url = config.client.base_url(), data_dir = %config.data_dir.display(), "Loaded configuration");

    helfinka_client::metrics::describe_metrics();

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
    let client = HttpClient::new(config.client)?;
    let session = SessionManager::for_client(storage.clone(), &client);
    session.restore();

    let app = App {
        client,
        session,
        tags: NoteTagHistory::new(storage.clone()),
        theme: ThemePreference::new(storage),
    };

    commands::run(cli.command, &app).await
}
