//! Persistence for tracked releases.
//!
//! [`Store`] owns the `files` table and runs every statement through a
//! [`RetryPolicy`], so a sweep and an interactive command writing at the same
//! time back off on lock contention instead of failing.
//!
//! # Lookup filtering
//!
//! | Method | Soft-deleted rows |
//! |--------|-------------------|
//! | [`Store::list_active`] | excluded |
//! | [`Store::find_active`] | excluded |
//! | [`Store::get_by_id`] | included |
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(Database::new(path).await?);
//! let cancel = CancellationToken::new();
//! for item in store.list_active(&cancel).await? {
//!     println!("{} {}", item.id, item.name);
//! }
//! ```

mod error;
mod retry;

pub use error::{DbErrorKind, StoreError};
pub use retry::{DEFAULT_BASE_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_JITTER, RetryPolicy};

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::db::Database;
use crate::metadata::{FileMetadata, now};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

const SELECT_COLUMNS: &str = r"SELECT
        id,
        original_url,
        magnet,
        name,
        last_comment,
        last_sync_at,
        torrent_updated_at,
        location,
        created_at,
        deleted_at
    FROM files";

/// Repository over the `files` table with busy-retry semantics.
#[derive(Debug, Clone)]
pub struct Store {
    db: Database,
    policy: RetryPolicy,
}

impl Store {
    /// Creates a store with the default retry policy.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self::with_policy(db, RetryPolicy::default())
    }

    /// Creates a store with a custom retry policy.
    #[must_use]
    pub fn with_policy(db: Database, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    /// Inserts the record or replaces every mutable column of an existing one.
    ///
    /// `created_at` is written only on first insert and `original_url` never
    /// changes afterwards. `deleted_at` is cleared, so re-tracking a removed
    /// release reactivates it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement fails after retries.
    #[instrument(skip(self, metadata, cancel), fields(id = %metadata.id))]
    pub async fn upsert(&self, metadata: &FileMetadata, cancel: &CancellationToken) -> Result<()> {
        let pool = self.db.pool();
        let created_at = metadata.created_at.unwrap_or_else(now);

        self.policy
            .run(cancel, || async move {
                sqlx::query(
                    r"INSERT INTO files (
                        id,
                        original_url,
                        magnet,
                        name,
                        last_comment,
                        last_sync_at,
                        torrent_updated_at,
                        location,
                        created_at,
                        deleted_at
                      )
                      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
                      ON CONFLICT(id) DO UPDATE SET
                        magnet = excluded.magnet,
                        name = excluded.name,
                        last_comment = excluded.last_comment,
                        last_sync_at = excluded.last_sync_at,
                        torrent_updated_at = excluded.torrent_updated_at,
                        location = excluded.location,
                        deleted_at = NULL",
                )
                .bind(&metadata.id)
                .bind(&metadata.original_url)
                .bind(&metadata.magnet)
                .bind(&metadata.name)
                .bind(&metadata.last_comment)
                .bind(metadata.last_sync_at)
                .bind(metadata.torrent_updated_at)
                .bind(&metadata.location)
                .bind(created_at)
                .execute(pool)
                .await
            })
            .await?;

        Ok(())
    }

    /// Returns every active record, most recently updated on the tracker first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails after retries.
    #[instrument(skip(self, cancel))]
    pub async fn list_active(&self, cancel: &CancellationToken) -> Result<Vec<FileMetadata>> {
        let pool = self.db.pool();
        let sql =
            format!("{SELECT_COLUMNS} WHERE deleted_at IS NULL ORDER BY torrent_updated_at DESC");
        let sql = sql.as_str();

        self.policy
            .run(cancel, || async move {
                sqlx::query_as::<_, FileMetadata>(sql).fetch_all(pool).await
            })
            .await
    }

    /// Looks a record up by id, including soft-deleted ones.
    ///
    /// A missing row is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails after retries.
    #[instrument(skip(self, cancel))]
    pub async fn get_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<FileMetadata>> {
        let pool = self.db.pool();
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let sql = sql.as_str();

        self.policy
            .run(cancel, || async move {
                sqlx::query_as::<_, FileMetadata>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await
    }

    /// Looks an active record up by id; soft-deleted rows read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails after retries.
    #[instrument(skip(self, cancel))]
    pub async fn find_active(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<FileMetadata>> {
        let pool = self.db.pool();
        let sql = format!("{SELECT_COLUMNS} WHERE id = ? AND deleted_at IS NULL");
        let sql = sql.as_str();

        self.policy
            .run(cancel, || async move {
                sqlx::query_as::<_, FileMetadata>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await
    }

    /// Soft-deletes a record by stamping `deleted_at`.
    ///
    /// Returns `false` when there was no active row with that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement fails after retries.
    #[instrument(skip(self, cancel))]
    pub async fn remove(&self, id: &str, cancel: &CancellationToken) -> Result<bool> {
        let pool = self.db.pool();
        let deleted_at = now();

        let result = self
            .policy
            .run(cancel, || async move {
                sqlx::query("UPDATE files SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                    .bind(deleted_at)
                    .bind(id)
                    .execute(pool)
                    .await
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the destination folder of an active record.
    ///
    /// Returns `false` when there was no active row with that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement fails after retries.
    #[instrument(skip(self, cancel))]
    pub async fn update_location(
        &self,
        id: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let pool = self.db.pool();

        let result = self
            .policy
            .run(cancel, || async move {
                sqlx::query("UPDATE files SET location = ? WHERE id = ? AND deleted_at IS NULL")
                    .bind(location)
                    .bind(id)
                    .execute(pool)
                    .await
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
