//! Durable record of which release-notes entries have been announced.
//!
//! The pipeline talks to the store through [`DedupStore`]; [`Database`] is
//! the SQLite implementation. A record's existence under a key is the only
//! signal that the entry was already handled.

mod records;
mod schema;
mod types;

use async_trait::async_trait;

pub use schema::Database;
pub use types::{DedupRecord, PutOutcome, StoreError, StoredRecord};

/// Existence check plus create-if-absent write, keyed by dedup key.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// `Ok(false)` when no record exists. Errors must never be read as absence.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Write `record` under `key` unless a record is already there.
    async fn put(&self, key: &str, record: &DedupRecord) -> Result<PutOutcome, StoreError>;
}
