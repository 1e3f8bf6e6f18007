//! Errors surfaced by single-item engine operations.

use thiserror::Error;

use crate::client::DownloadClientError;
use crate::store::StoreError;
use crate::tracker::TrackerError;

/// First hard error of a single-item operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The tracker page could not be fetched or has no provider.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The store failed after retries, or the wait was cancelled.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The download client rejected a request.
    #[error(transparent)]
    Download(#[from] DownloadClientError),

    /// No active record has this id.
    #[error("no tracked item with id '{0}'\n  Suggestion: Run `magnet-sync list` to see tracked ids")]
    NotFound(String),
}

impl SyncError {
    /// Returns true when the error is a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Store(StoreError::Cancelled))
    }
}
