//! CLI entry point for magnet-sync.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use magnet_sync_core::{
    Database, LoggingClient, MetadataParser, ProviderRegistry, Store, SyncEngine,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed options
    let dotenv = dotenvy::dotenv();

    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => debug!("no .env file, using environment only"),
        Err(err) => warn!(error = %err, "failed to load .env"),
    }

    debug!(?args, "CLI arguments parsed");

    let settings = args.settings();
    settings.validate()?;

    let db = Database::new(&settings.database_path).await?;
    let store = Store::with_policy(db.clone(), settings.retry_policy());
    let parser = MetadataParser::new(settings.page_fetcher()?, ProviderRegistry::with_defaults());
    let client = LoggingClient::new(settings.default_location.clone());

    // Update notifications are printed as they arrive
    let (notifier, mut notifications) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(message) = notifications.recv().await {
            println!("{message}");
        }
    });

    let engine = SyncEngine::new(Arc::new(parser), store, Arc::new(client), notifier)
        .with_dry_mode(settings.dry_mode);

    if engine.is_dry_mode() {
        info!("dry mode: download tasks are not created");
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            interrupt.cancel();
        }
    });

    let result = run(&engine, &args.command, &cancel).await;

    // Closing the sender lets the printer drain and exit
    drop(engine);
    if let Err(err) = printer.await {
        warn!(error = %err, "notification printer failed");
    }
    db.close().await;

    result
}

async fn run(engine: &SyncEngine, command: &Command, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Add { url, location } => {
            commands::run_add_command(engine, url, location.as_deref(), cancel).await
        }
        Command::Sync { id } => commands::run_sync_command(engine, id.as_deref(), cancel).await,
        Command::Watch { interval_secs } => {
            commands::run_watch_command(engine, Duration::from_secs(*interval_secs), cancel).await
        }
        Command::List => commands::run_list_command(engine, cancel).await,
        Command::Show { id } => commands::run_show_command(engine, id, cancel).await,
        Command::Remove { id } => commands::run_remove_command(engine, id, cancel).await,
        Command::Relocate { id, location } => {
            commands::run_relocate_command(engine, id, location, cancel).await
        }
        Command::Locations => commands::run_locations_command(engine).await,
    }
}
