//! Download-task collaborator.
//!
//! The reconciliation engine never talks to a torrent client directly; it goes
//! through [`DownloadClient`]. [`LoggingClient`] is the built-in
//! implementation: it records every request in the log and derives task ids
//! from the magnet info-hash, which is enough for dry runs and for wiring a
//! real client later.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

/// A destination folder offered by the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Folder path passed back to [`DownloadClient::set_location`].
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Errors reported by a download client.
#[derive(Debug, Clone, Error)]
pub enum DownloadClientError {
    /// The client rejected or failed the request.
    #[error("download client request failed: {message}")]
    Request {
        /// Client-provided reason.
        message: String,
    },

    /// No task matches the magnet link.
    #[error("torrent not found for magnet: {magnet}")]
    NotFound {
        /// Magnet that was looked up.
        magnet: String,
    },
}

/// Operations the engine needs from a torrent client.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Queues `source` (magnet or URL) for download into `destination`.
    async fn create_download_task(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<(), DownloadClientError>;

    /// Folder used when a record has no override.
    fn default_location(&self) -> String;

    /// Resolves the client task id for a magnet link.
    async fn hash_by_magnet(&self, magnet: &str) -> Result<String, DownloadClientError>;

    /// Moves an existing task to `location`.
    async fn set_location(&self, task_id: &str, location: &str)
    -> Result<(), DownloadClientError>;

    /// Folders the client offers.
    async fn locations(&self) -> Vec<Location>;
}

/// Standard folder layout offered when no custom list is configured.
#[must_use]
pub fn standard_locations() -> Vec<Location> {
    [
        ("/downloads/tv shows", "TV Shows"),
        ("/downloads/other", "Other"),
        ("/downloads/movies", "Movies"),
        ("/downloads/books", "Books"),
        ("/downloads/audiobooks", "Audiobooks"),
        ("/downloads/music", "Music"),
        ("/downloads/anime", "Anime"),
    ]
    .into_iter()
    .map(|(id, name)| Location::new(id, name))
    .collect()
}

/// Extracts the lowercase BitTorrent info-hash from a magnet URI.
#[must_use]
pub fn info_hash(magnet: &str) -> Option<String> {
    let url = Url::parse(magnet).ok()?;
    if url.scheme() != "magnet" {
        return None;
    }
    url.query_pairs().find_map(|(key, value)| {
        if key != "xt" {
            return None;
        }
        let hash = value.strip_prefix("urn:btih:")?;
        (!hash.is_empty()).then(|| hash.to_ascii_lowercase())
    })
}

/// Client that only logs what it would do.
#[derive(Debug, Clone)]
pub struct LoggingClient {
    default_location: String,
    locations: Vec<Location>,
}

impl LoggingClient {
    /// Creates a client with the standard folder layout.
    #[must_use]
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
            locations: standard_locations(),
        }
    }

    /// Replaces the offered folders.
    #[must_use]
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }
}

#[async_trait]
impl DownloadClient for LoggingClient {
    #[instrument(skip(self))]
    async fn create_download_task(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<(), DownloadClientError> {
        if source.is_empty() {
            return Err(DownloadClientError::Request {
                message: "empty download source".to_string(),
            });
        }
        info!(source, destination, "download task requested");
        Ok(())
    }

    fn default_location(&self) -> String {
        self.default_location.clone()
    }

    async fn hash_by_magnet(&self, magnet: &str) -> Result<String, DownloadClientError> {
        info_hash(magnet).ok_or_else(|| DownloadClientError::NotFound {
            magnet: magnet.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn set_location(
        &self,
        task_id: &str,
        location: &str,
    ) -> Result<(), DownloadClientError> {
        info!(task_id, location, "task move requested");
        Ok(())
    }

    async fn locations(&self) -> Vec<Location> {
        self.locations.clone()
    }
}
