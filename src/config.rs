//! Runtime settings shared by the library and the CLI.
//!
//! The binary fills [`Settings`] from flags and environment variables; the
//! library only consumes it.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::{DEFAULT_BASE_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_JITTER, RetryPolicy};
use crate::tracker::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_FETCH_TIMEOUT, PageFetcher};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = ".db/tasks.db";

/// Default download folder.
pub const DEFAULT_LOCATION: &str = "/downloads/tv shows";

/// Upper bound accepted for any fetch timeout.
const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Upper bound accepted for the store attempt ceiling.
const MAX_STORE_ATTEMPTS: u32 = 50;

/// Invalid setting values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A value is outside its accepted range.
    #[error("What: invalid {field}\nWhy: {reason}\nFix: {fix}")]
    OutOfRange {
        /// Setting name as shown to the user.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
        /// Accepted range.
        fix: &'static str,
    },

    /// A required text value is empty.
    #[error("What: missing {field}\nFix: set {field} to a non-empty value")]
    Empty {
        /// Setting name as shown to the user.
        field: &'static str,
    },
}

/// Everything the engine and its collaborators need to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Persist metadata but never create download tasks.
    pub dry_mode: bool,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Download folder for records without an override.
    pub default_location: String,
    /// TCP connect timeout per fetch.
    pub fetch_connect_timeout: Duration,
    /// Total timeout per fetch.
    pub fetch_timeout: Duration,
    /// Store attempt ceiling, including the first attempt.
    pub store_max_attempts: u32,
    /// Wait before the second store attempt.
    pub store_base_backoff: Duration,
    /// Upper bound of the random jitter added to every store wait.
    pub store_max_jitter: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dry_mode: false,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            default_location: DEFAULT_LOCATION.to_string(),
            fetch_connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            store_max_attempts: DEFAULT_MAX_ATTEMPTS,
            store_base_backoff: DEFAULT_BASE_BACKOFF,
            store_max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl Settings {
    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty {
                field: "database path",
            });
        }
        if self.default_location.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "default location",
            });
        }
        check_timeout("fetch timeout", self.fetch_timeout)?;
        check_timeout("fetch connect timeout", self.fetch_connect_timeout)?;
        if self.store_max_attempts == 0 || self.store_max_attempts > MAX_STORE_ATTEMPTS {
            return Err(ConfigError::OutOfRange {
                field: "store max attempts",
                reason: format!("{} is outside 1..={MAX_STORE_ATTEMPTS}", self.store_max_attempts),
                fix: "use a value between 1 and 50",
            });
        }
        Ok(())
    }

    /// Store retry policy built from these settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.store_max_attempts,
            self.store_base_backoff,
            self.store_max_jitter,
        )
    }

    /// Page fetcher honoring the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client builder error.
    pub fn page_fetcher(&self) -> Result<PageFetcher, reqwest::Error> {
        PageFetcher::with_timeouts(self.fetch_connect_timeout, self.fetch_timeout)
    }
}

fn check_timeout(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() || value > MAX_FETCH_TIMEOUT {
        return Err(ConfigError::OutOfRange {
            field,
            reason: format!("{}s is outside 1..=600 seconds", value.as_secs()),
            fix: "use a value between 1 and 600 seconds",
        });
    }
    Ok(())
}
