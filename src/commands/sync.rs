//! Sync and watch command handlers.

use std::time::Duration;

use anyhow::Result;
use magnet_sync_core::SyncEngine;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub async fn run_sync_command(
    engine: &SyncEngine,
    id: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    match id {
        Some(id) => {
            let outcome = engine.reconcile_one(id, cancel).await?;
            println!("{id}: {outcome}");
        }
        None => {
            let stats = engine.reconcile_all(cancel).await?;
            println!("{stats}");
        }
    }
    Ok(())
}

/// Runs a sweep every `interval` until `cancel` fires.
///
/// The first sweep starts immediately. A failed sweep is logged and the
/// next tick tries again.
pub async fn run_watch_command(
    engine: &SyncEngine,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "watching for updates");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match engine.reconcile_all(cancel).await {
            Ok(stats) => info!(%stats, "sweep complete"),
            Err(err) if err.is_cancelled() => break,
            Err(err) => error!(error = %err, "sweep failed"),
        }
    }

    info!("watch stopped");
    Ok(())
}
