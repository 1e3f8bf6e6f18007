//! URL to [`FileMetadata`] transformation.

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

use super::feed::{FeedItem, parse_feed};
use super::{PageFetcher, ProviderRegistry, TrackerError};
use crate::metadata::{FileMetadata, now};

/// Anything that can produce fresh metadata for a tracker URL.
///
/// # Object Safety
///
/// Uses `async_trait` so the reconciliation engine can hold an
/// `Arc<dyn MetadataSource>` and tests can substitute a fake.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches and parses `url`.
    async fn parse(&self, url: &str) -> Result<FileMetadata, TrackerError>;
}

/// Fetches a page, dispatches it to its provider and assembles the record.
///
/// Performs no persistence. The only I/O is the page fetch and, for
/// providers with a comment feed, the feed fetch.
pub struct MetadataParser {
    fetcher: PageFetcher,
    registry: ProviderRegistry,
}

impl MetadataParser {
    /// Creates a parser over an explicit fetcher and registry.
    #[must_use]
    pub fn new(fetcher: PageFetcher, registry: ProviderRegistry) -> Self {
        Self { fetcher, registry }
    }

    async fn fetch_feed(&self, feed_url: &str) -> Option<Vec<FeedItem>> {
        match self.fetcher.fetch(feed_url).await {
            Ok(body) => Some(parse_feed(&body)),
            Err(error) => {
                warn!(feed_url, error = %error, "comment feed unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl MetadataSource for MetadataParser {
    /// # Errors
    ///
    /// - [`TrackerError::ProviderNotFound`] before any network access
    /// - [`TrackerError::Fetch`] if the page cannot be retrieved
    #[instrument(skip(self))]
    async fn parse(&self, url: &str) -> Result<FileMetadata, TrackerError> {
        let provider = self.registry.select(url)?;
        let body = self.fetcher.fetch(url).await?;

        // the page tree is not Send, keep it out of the await below
        let (magnet, name, torrent_updated_at, feed_url) = {
            let page = Html::parse_document(&body);
            (
                provider.magnet_link(&page),
                provider.title(&page),
                provider.last_updated(&page),
                provider.comment_feed_url(&page),
            )
        };
        let id = provider.topic_id(url);

        if magnet.is_empty() {
            warn!(provider = provider.name(), "magnet link not found");
        }
        if name.is_empty() {
            warn!(provider = provider.name(), "title not found");
        }

        let last_comment = match feed_url {
            Some(feed_url) => self
                .fetch_feed(&feed_url)
                .await
                .map(|items| provider.comment_from_feed(&items))
                .unwrap_or_default(),
            None => String::new(),
        };

        debug!(provider = provider.name(), id = %id, updated = %torrent_updated_at, "page parsed");
        info!(id = %id, name = %name, "metadata parsed");

        Ok(FileMetadata {
            id,
            original_url: url.to_string(),
            magnet,
            name,
            last_comment,
            last_sync_at: now(),
            torrent_updated_at,
            location: String::new(),
            created_at: None,
            deleted_at: None,
        })
    }
}
