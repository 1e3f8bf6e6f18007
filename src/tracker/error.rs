//! Error types for tracker page retrieval and parsing.
//!
//! Messages follow the What/Why/Fix shape used across the crate so the CLI
//! can print them verbatim.

use thiserror::Error;

/// Errors raised while retrieving a page or feed.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("bad status fetching '{url}': {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status line text, e.g. `503 Service Unavailable`.
        status: String,
    },

    /// Connection-level failure (DNS, refused, TLS, ...).
    #[error("network error fetching '{url}': {message}\n  Suggestion: Check connectivity to the tracker")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying client message.
        message: String,
    },

    /// The request did not finish within the configured timeout.
    #[error("timed out fetching '{url}'\n  Suggestion: Raise --fetch-timeout-secs or retry later")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// The response body could not be read.
    #[error("failed to read body of '{url}': {message}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying client message.
        message: String,
    },
}

impl FetchError {
    /// Maps a transport error to `Timeout` or `Network`.
    #[must_use]
    pub fn from_transport(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Errors surfaced by the metadata parser.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// No registered provider claims the URL.
    #[error("provider not found for url: {url}\n  Suggestion: Supported trackers: {supported}")]
    ProviderNotFound {
        /// URL that matched no base URL.
        url: String,
        /// Comma separated base URLs that are registered.
        supported: String,
    },

    /// The tracker page could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl TrackerError {
    /// Creates a `ProviderNotFound` error listing the known base URLs.
    #[must_use]
    pub fn provider_not_found(url: &str, supported: &[&str]) -> Self {
        Self::ProviderNotFound {
            url: url.to_string(),
            supported: supported.join(", "),
        }
    }
}
