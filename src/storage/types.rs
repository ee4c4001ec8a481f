use crate::feed::FeedEntry;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Dedup store errors.
///
/// A missing key is not an error: `exists` answers `Ok(false)`. Every variant
/// here means the store could not give a trustworthy answer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (locked, cannot open, pool exhausted or closed)
    #[error("Dedup store unavailable: {0}")]
    Unavailable(String),

    /// Migration failed
    #[error("Dedup store migration failed: {0}")]
    Migration(String),

    /// Any other database error; treated as an ambiguous answer
    #[error("Dedup store error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error, separating reachability problems from the rest
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                return StoreError::Unavailable(err.to_string());
            }
            _ => {}
        }

        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StoreError::Unavailable(err.to_string());
        }

        StoreError::Other(err)
    }

    /// Like [`StoreError::from_sqlx`], but anything not classed as
    /// unavailable is a schema failure.
    pub(crate) fn from_migration(err: sqlx::Error) -> Self {
        match Self::from_sqlx(err) {
            StoreError::Other(err) => StoreError::Migration(err.to_string()),
            other => other,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// The persisted copy of an announced entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupRecord {
    pub identity: String,
    pub title: String,
    /// RFC 3339
    pub published_at: Option<String>,
    pub link: Option<String>,
    pub content_type: String,
    pub content_body: String,
}

impl From<&FeedEntry> for DedupRecord {
    fn from(entry: &FeedEntry) -> Self {
        Self {
            identity: entry.identity.clone(),
            title: entry.title.clone(),
            published_at: entry.published_at.map(|dt| dt.to_rfc3339()),
            link: entry.link.clone(),
            content_type: entry.content_type.clone(),
            content_body: entry.content_body.clone(),
        }
    }
}

/// A record as read back from the store, with its key and write time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRecord {
    pub kind: String,
    pub key: String,
    pub identity: String,
    pub title: String,
    pub published_at: Option<String>,
    pub link: Option<String>,
    pub content_type: String,
    pub content_body: String,
    /// Unix seconds
    pub recorded_at: i64,
}

/// What `put` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    /// A record already existed under the key and was left untouched.
    /// Means a concurrent invocation won the race.
    AlreadyPresent,
}
