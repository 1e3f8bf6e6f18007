//! Per-item outcomes and sweep counters.

use std::fmt;

/// Terminal state of one reconciled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Tracker update time unchanged; only the sync time was refreshed.
    Current,
    /// Metadata refreshed and a download task created (or skipped in dry mode).
    Synced,
    /// Metadata refreshed but the download client failed.
    DownloadFailed,
    /// The page could not be parsed; nothing was written.
    Skipped,
}

impl SyncOutcome {
    /// Lowercase label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Synced => "synced",
            Self::DownloadFailed => "download_failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one full sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    current: usize,
    synced: usize,
    download_failed: usize,
    skipped: usize,
    failed: usize,
}

impl SyncStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items whose tracker update time was unchanged.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Items refreshed with a successful (or dry) download request.
    #[must_use]
    pub fn synced(&self) -> usize {
        self.synced
    }

    /// Items refreshed whose download request failed.
    #[must_use]
    pub fn download_failed(&self) -> usize {
        self.download_failed
    }

    /// Items skipped because the page could not be parsed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Items that hit a store error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Every item the sweep looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.current + self.synced + self.download_failed + self.skipped + self.failed
    }

    pub(crate) fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Current => self.current += 1,
            SyncOutcome::Synced => self.synced += 1,
            SyncOutcome::DownloadFailed => self.download_failed += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed += 1;
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked: {} current, {} synced, {} download failed, {} skipped, {} failed",
            self.total(),
            self.current,
            self.synced,
            self.download_failed,
            self.skipped,
            self.failed
        )
    }
}
