//! Reconciliation engine.
//!
//! [`SyncEngine`] re-parses tracked pages, compares the tracker's update time
//! with the stored one and acts on the difference:
//!
//! | Stored vs fresh `torrent_updated_at` | Store write | Side effects |
//! |--------------------------------------|-------------|--------------|
//! | equal | full upsert | none |
//! | different | full upsert | notification, download task unless dry mode |
//!
//! Side-effect failures never roll back the metadata write. A full sweep
//! isolates each item; single-item operations return their first hard error.

mod error;
mod stats;

pub use error::SyncError;
pub use stats::{SyncOutcome, SyncStats};

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{DownloadClient, Location};
use crate::metadata::FileMetadata;
use crate::store::{Store, StoreError};
use crate::tracker::MetadataSource;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Renders metadata as a fenced, pretty-printed JSON block.
///
/// # Errors
///
/// Returns the serializer error.
pub fn metadata_message(metadata: &FileMetadata) -> std::result::Result<String, serde_json::Error> {
    let json = serde_json::to_string_pretty(metadata)?;
    Ok(format!("```json\n{json}\n```"))
}

/// Coordinates parser, store, download client and notification sink.
pub struct SyncEngine {
    source: Arc<dyn MetadataSource>,
    store: Store,
    client: Arc<dyn DownloadClient>,
    notifier: UnboundedSender<String>,
    dry_mode: bool,
}

impl SyncEngine {
    /// Creates an engine that creates download tasks.
    #[must_use]
    pub fn new(
        source: Arc<dyn MetadataSource>,
        store: Store,
        client: Arc<dyn DownloadClient>,
        notifier: UnboundedSender<String>,
    ) -> Self {
        Self {
            source,
            store,
            client,
            notifier,
            dry_mode: false,
        }
    }

    /// Enables or disables dry mode (metadata is persisted, no download tasks).
    #[must_use]
    pub fn with_dry_mode(mut self, dry_mode: bool) -> Self {
        self.dry_mode = dry_mode;
        self
    }

    /// Returns true when download tasks are suppressed.
    #[must_use]
    pub fn is_dry_mode(&self) -> bool {
        self.dry_mode
    }

    /// Parses a new URL, stores it and queues the download.
    ///
    /// `location` overrides the download client's default folder.
    ///
    /// # Errors
    ///
    /// Returns the first hard error: parse, store, or download client.
    #[instrument(skip(self, cancel))]
    pub async fn track(
        &self,
        url: &str,
        location: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FileMetadata> {
        let mut metadata = self.source.parse(url).await?;
        metadata.location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map_or_else(|| self.client.default_location(), str::to_string);

        self.store.upsert(&metadata, cancel).await?;

        if self.dry_mode {
            info!(id = %metadata.id, "dry mode, download task not created");
            return Ok(metadata);
        }

        self.client
            .create_download_task(&metadata.magnet, &metadata.location)
            .await?;
        info!(id = %metadata.id, name = %metadata.name, "download task created");

        Ok(metadata)
    }

    /// Reconciles every active record, one at a time.
    ///
    /// Parse failures are counted as skipped and store failures as failed;
    /// neither stops the sweep.
    ///
    /// # Errors
    ///
    /// Returns an error only if the active list cannot be loaded or the
    /// sweep is cancelled.
    #[instrument(skip(self, cancel))]
    pub async fn reconcile_all(&self, cancel: &CancellationToken) -> Result<SyncStats> {
        info!("checking for updates");
        let records = self.store.list_active(cancel).await?;
        let mut stats = SyncStats::new();

        for stored in &records {
            if cancel.is_cancelled() {
                warn!(%stats, "sweep cancelled");
                return Err(SyncError::Store(StoreError::Cancelled));
            }

            match self.reconcile_record(stored, cancel).await {
                Ok(outcome) => {
                    debug!(id = %stored.id, %outcome, "item reconciled");
                    stats.record(outcome);
                }
                Err(SyncError::Tracker(err)) => {
                    error!(id = %stored.id, error = %err, "error parsing metadata, skipping");
                    stats.record(SyncOutcome::Skipped);
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    error!(id = %stored.id, error = %err, "failed to reconcile item");
                    stats.record_failure();
                }
            }
        }

        info!(%stats, "sweep finished");
        Ok(stats)
    }

    /// Reconciles one active record on demand.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for unknown or removed ids, otherwise the first
    /// parse or store error.
    #[instrument(skip(self, cancel))]
    pub async fn reconcile_one(&self, id: &str, cancel: &CancellationToken) -> Result<SyncOutcome> {
        let stored = self
            .store
            .find_active(id, cancel)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        self.reconcile_record(&stored, cancel).await
    }

    async fn reconcile_record(
        &self,
        stored: &FileMetadata,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome> {
        let mut fresh = self.source.parse(&stored.original_url).await?;

        if fresh.id != stored.id {
            warn!(stored = %stored.id, parsed = %fresh.id, "parsed id differs, keeping stored id");
            fresh.id.clone_from(&stored.id);
        }
        fresh.location = if stored.location.is_empty() {
            self.client.default_location()
        } else {
            stored.location.clone()
        };
        fresh.created_at = stored.created_at;

        if !stored.is_outdated_by(&fresh) {
            info!(id = %stored.id, "metadata is up to date");
            // comment, title and magnet can change without a new edit time
            self.store.upsert(&fresh, cancel).await?;
            return Ok(SyncOutcome::Current);
        }

        info!(
            id = %stored.id,
            stored = %stored.torrent_updated_at,
            fresh = %fresh.torrent_updated_at,
            "metadata is outdated"
        );
        self.store.upsert(&fresh, cancel).await?;
        info!(id = %fresh.id, "metadata updated");

        self.notify_update(&fresh);

        if self.dry_mode {
            info!(id = %fresh.id, "dry mode, skipping download");
            return Ok(SyncOutcome::Synced);
        }

        match self
            .client
            .create_download_task(&fresh.magnet, &fresh.location)
            .await
        {
            Ok(()) => {
                info!(id = %fresh.id, name = %fresh.name, "download task created");
                Ok(SyncOutcome::Synced)
            }
            Err(err) => {
                error!(id = %fresh.id, error = %err, "error creating download task");
                Ok(SyncOutcome::DownloadFailed)
            }
        }
    }

    fn notify_update(&self, metadata: &FileMetadata) {
        let body = match metadata_message(metadata) {
            Ok(body) => body,
            Err(err) => {
                error!(id = %metadata.id, error = %err, "error formatting metadata");
                return;
            }
        };
        if self
            .notifier
            .send(format!("✅ Metadata updated:\n\n{body}"))
            .is_err()
        {
            warn!(id = %metadata.id, "notification channel closed");
        }
    }

    /// Soft-deletes an active record.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] if no active record has this id.
    #[instrument(skip(self, cancel))]
    pub async fn remove(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        if self.store.remove(id, cancel).await? {
            info!(id, "tracked item removed");
            Ok(())
        } else {
            Err(SyncError::NotFound(id.to_string()))
        }
    }

    /// Changes the download folder of an active record and moves its task.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for unknown ids, otherwise the first store or
    /// download client error.
    #[instrument(skip(self, cancel))]
    pub async fn relocate(
        &self,
        id: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let stored = self
            .store
            .find_active(id, cancel)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        if !self.store.update_location(id, location, cancel).await? {
            return Err(SyncError::NotFound(id.to_string()));
        }

        if self.dry_mode {
            info!(id, location, "dry mode, task not moved");
            return Ok(());
        }

        let task_id = self.client.hash_by_magnet(&stored.magnet).await?;
        self.client.set_location(&task_id, location).await?;
        info!(id, task_id = %task_id, location, "task moved");
        Ok(())
    }

    /// Folders offered by the download client.
    pub async fn locations(&self) -> Vec<Location> {
        self.client.locations().await
    }

    /// Active records, most recently updated on the tracker first.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<FileMetadata>> {
        Ok(self.store.list_active(cancel).await?)
    }

    /// Looks a record up by id, including removed ones.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] if the id was never tracked.
    pub async fn show(&self, id: &str, cancel: &CancellationToken) -> Result<FileMetadata> {
        self.store
            .get_by_id(id, cancel)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }
}
