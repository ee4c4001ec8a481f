use async_trait::async_trait;

use super::schema::Database;
use super::types::{DedupRecord, PutOutcome, StoreError, StoredRecord};
use super::DedupStore;

#[async_trait]
impl DedupStore for Database {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM dedup_records WHERE kind = ? AND key = ?")
                .bind(&*self.kind)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)?;

        Ok(row.is_some())
    }

    /// Create-if-absent. An existing record is never overwritten.
    async fn put(&self, key: &str, record: &DedupRecord) -> Result<PutOutcome, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO dedup_records
                (kind, key, identity, title, published_at, link, content_type, content_body, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(kind, key) DO NOTHING
        "#,
        )
        .bind(&*self.kind)
        .bind(key)
        .bind(&record.identity)
        .bind(&record.title)
        .bind(&record.published_at)
        .bind(&record.link)
        .bind(&record.content_type)
        .bind(&record.content_body)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() > 0 {
            Ok(PutOutcome::Created)
        } else {
            Ok(PutOutcome::AlreadyPresent)
        }
    }
}

impl Database {
    // ========================================================================
    // Inspection
    // ========================================================================

    /// Fetch the record stored under `key`, if any.
    pub async fn get_record(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT kind, key, identity, title, published_at, link,
                   content_type, content_body, recorded_at
            FROM dedup_records
            WHERE kind = ? AND key = ?
        "#,
        )
        .bind(&*self.kind)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Number of records of this handle's kind.
    pub async fn count_records(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dedup_records WHERE kind = ?")
            .bind(&*self.kind)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(count)
    }
}
