//! The tracked release record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Current wall-clock time, naive and local like every scraped timestamp.
#[must_use]
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Metadata for one tracked release, keyed by the tracker topic id.
///
/// Freshly parsed records carry no `location`, `created_at` or `deleted_at`;
/// those are owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileMetadata {
    /// Topic identifier derived from `original_url`.
    pub id: String,
    /// Tracker page URL; never changes once stored.
    pub original_url: String,
    /// Magnet URI, empty when the page had none.
    pub magnet: String,
    /// Release title.
    pub name: String,
    /// Latest comment text, empty when the provider has no feed.
    pub last_comment: String,
    /// When the page was last parsed successfully.
    pub last_sync_at: NaiveDateTime,
    /// Edit/registration time printed on the page; the staleness key.
    pub torrent_updated_at: NaiveDateTime,
    /// Destination folder override.
    #[serde(default)]
    pub location: String,
    #[serde(skip)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

impl FileMetadata {
    /// Returns true when the record was soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true when the tracker reports a different update time than `other`.
    #[must_use]
    pub fn is_outdated_by(&self, other: &FileMetadata) -> bool {
        self.torrent_updated_at != other.torrent_updated_at
    }
}
