//! Magnet Sync Core Library
//!
//! Watches torrent-tracker topic pages and re-syncs releases when the tracker
//! reports a newer edit time than the one last seen.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`date`] - Localized tracker date parsing
//! - [`metadata`] - The tracked release record
//! - [`tracker`] - Providers, page fetching and metadata parsing
//! - [`db`] - Database connection and schema management
//! - [`store`] - Busy-retrying persistence of tracked releases
//! - [`client`] - Download-task collaborator
//! - [`sync`] - Reconciliation engine
//! - [`config`] - Runtime settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod date;
pub mod db;
pub mod metadata;
pub mod store;
pub mod sync;
pub mod tracker;

// Re-export commonly used types
pub use client::{DownloadClient, DownloadClientError, Location, LoggingClient};
pub use config::{ConfigError, Settings};
pub use date::{DateError, DateLayout, format_localized_date, parse_localized_date};
pub use db::{Database, DbError};
pub use metadata::FileMetadata;
pub use store::{DbErrorKind, RetryPolicy, Store, StoreError};
pub use sync::{SyncEngine, SyncError, SyncOutcome, SyncStats, metadata_message};
pub use tracker::{
    FetchError, MetadataParser, MetadataSource, PageFetcher, Provider, ProviderRegistry,
    TrackerError,
};
