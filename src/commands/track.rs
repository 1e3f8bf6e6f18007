//! Add command handler: start tracking a topic page.

use anyhow::Result;
use magnet_sync_core::{SyncEngine, metadata_message};
use tokio_util::sync::CancellationToken;

pub async fn run_add_command(
    engine: &SyncEngine,
    url: &str,
    location: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    let metadata = engine.track(url, location, cancel).await?;
    let body = metadata_message(&metadata)?;

    if engine.is_dry_mode() {
        println!("✅ Tracked (dry mode, no download task):\n\n{body}");
    } else {
        println!("✅ Download task created:\n\n{body}");
    }
    Ok(())
}
