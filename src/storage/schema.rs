use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::types::StoreError;

// ============================================================================
// Database
// ============================================================================

/// SQLite-backed dedup store, scoped to one record kind.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
    pub(crate) kind: Arc<str>,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// `kind` is the first half of every composite key this handle reads
    /// and writes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the file cannot be opened or is
    /// locked, `StoreError::Migration` if the schema cannot be created.
    pub async fn open(path: &str, kind: &str) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: wait up to 5 seconds for a competing writer
        // (an overlapping invocation) before returning SQLITE_BUSY.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(StoreError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // Each invocation issues one read and at most one write
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(StoreError::from_sqlx)?;
        let db = Self {
            pool,
            kind: Arc::from(kind),
        };
        db.migrate().await.map_err(StoreError::from_migration)?;
        tracing::debug!(path = %path, kind = %kind, "Dedup store ready");
        Ok(db)
    }

    /// The record kind this handle is scoped to
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Close every pooled connection. Later calls fail with `Unavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run migrations in a single transaction. Idempotent.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Records are insert-only; (kind, key) is the dedup identity
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dedup_records (
                kind TEXT NOT NULL,
                key TEXT NOT NULL,
                identity TEXT NOT NULL,
                title TEXT NOT NULL,
                published_at TEXT,
                link TEXT,
                content_type TEXT NOT NULL,
                content_body TEXT NOT NULL,
                recorded_at INTEGER NOT NULL,
                PRIMARY KEY (kind, key)
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_dedup_records_recorded ON dedup_records(kind, recorded_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
