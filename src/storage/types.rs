use serde::Serialize;
use thiserror::Error;

use crate::feed::FeedRef;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The feed database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// The feed URL is already registered
    #[error("Feed already exists: {0}")]
    Duplicate(String),

    /// No feed with this id
    #[error("No feed with id {0}")]
    NotFound(i64),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Feed Records
// ============================================================================

/// A registered feed as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredFeed {
    pub id: i64,
    pub url: String,
    /// Unix timestamp (seconds)
    pub added_at: i64,
}

impl From<StoredFeed> for FeedRef {
    fn from(feed: StoredFeed) -> Self {
        FeedRef::new(feed.id, feed.url)
    }
}
