//! Record management command handlers.

use anyhow::Result;
use magnet_sync_core::{SyncEngine, metadata_message};
use tokio_util::sync::CancellationToken;

pub async fn run_list_command(engine: &SyncEngine, cancel: &CancellationToken) -> Result<()> {
    let items = engine.list(cancel).await?;
    if items.is_empty() {
        println!("No tracked items.");
        return Ok(());
    }

    for item in items {
        println!(
            "{}\t{}\t{}\t{}",
            item.id, item.torrent_updated_at, item.location, item.name
        );
    }
    Ok(())
}

pub async fn run_show_command(
    engine: &SyncEngine,
    id: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let item = engine.show(id, cancel).await?;
    println!("{}", metadata_message(&item)?);
    if let Some(deleted_at) = item.deleted_at {
        println!("removed at {deleted_at}");
    }
    Ok(())
}

pub async fn run_remove_command(
    engine: &SyncEngine,
    id: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    engine.remove(id, cancel).await?;
    println!("Removed {id}");
    Ok(())
}

pub async fn run_relocate_command(
    engine: &SyncEngine,
    id: &str,
    location: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    engine.relocate(id, location, cancel).await?;
    println!("Moved {id} to {location}");
    Ok(())
}

pub async fn run_locations_command(engine: &SyncEngine) -> Result<()> {
    for location in engine.locations().await {
        println!("{}\t{}", location.id, location.name);
    }
    Ok(())
}
