//! Tracker page retrieval and metadata extraction.
//!
//! # Architecture
//!
//! - [`Provider`] - per-site extraction capability set
//! - [`NnmProvider`], [`RutrackerProvider`] - built-in sites
//! - [`ProviderRegistry`] - longest base-URL prefix dispatch
//! - [`PageFetcher`] - bounded, charset-aware HTTP GET
//! - [`MetadataParser`] - URL to [`FileMetadata`](crate::FileMetadata)
//! - [`MetadataSource`] - trait seam consumed by the reconciliation engine
//!
//! # Example
//!
//! ```no_run
//! use magnet_sync_core::tracker::{MetadataParser, MetadataSource, PageFetcher, ProviderRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = MetadataParser::new(PageFetcher::new()?, ProviderRegistry::with_defaults());
//! let meta = parser.parse("https://rutracker.org/forum/viewtopic.php?t=6543210").await?;
//! println!("{} updated {}", meta.name, meta.torrent_updated_at);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod feed;
mod fetch;
mod nnm;
mod parser;
mod provider;
mod registry;
mod rutracker;

pub use error::{FetchError, TrackerError};
pub use feed::FeedItem;
pub use fetch::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FETCH_TIMEOUT, PageFetcher, charset_from_content_type,
    decode_body, sniff_meta_charset,
};
pub use nnm::{NNM_BASE_URL, NnmProvider};
pub use parser::{MetadataParser, MetadataSource};
pub use provider::{Provider, TOPIC_PARAM};
pub use registry::ProviderRegistry;
pub use rutracker::{RUTRACKER_BASE_URL, RutrackerProvider};
