//! Persistence ports for the shared key-value store and the append-only log.

use async_trait::async_trait;

use crate::error::StorageError;

/// The external store shared between the worker and stateless readers.
///
/// Values are opaque strings; callers own the encoding.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a key. `Ok(None)` means the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a key wholesale.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One page of records read from a log partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub records: Vec<String>,
    /// Index to pass as `cursor` for the next page, if more records exist.
    pub next_cursor: Option<usize>,
    /// Total records in the partition at read time.
    pub total: usize,
}

/// Append-only store partitioned by stream name and UTC date (`YYYY-MM-DD`).
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one encoded record to `{stream}:{date}`.
    async fn append(&self, stream: &str, date: &str, record: &str) -> Result<(), StorageError>;

    /// Read up to `limit` records starting at index `cursor`.
    async fn read_page(
        &self,
        stream: &str,
        date: &str,
        cursor: usize,
        limit: usize,
    ) -> Result<LogPage, StorageError>;

    /// Read every record of a partition, in append order.
    async fn read_all(&self, stream: &str, date: &str) -> Result<Vec<String>, StorageError>;

    /// Dates that have at least one record for `stream`, ascending.
    async fn dates(&self, stream: &str) -> Result<Vec<String>, StorageError>;
}

/// Key scheme shared by every log store backend.
#[must_use]
pub fn partition_key(stream: &str, date: &str) -> String {
    format!("{stream}:{date}")
}

/// Slice a full partition into a page.
#[must_use]
pub fn page_of(records: &[String], cursor: usize, limit: usize) -> LogPage {
    let total = records.len();
    let start = cursor.min(total);
    let end = start.saturating_add(limit).min(total);
    LogPage {
        records: records[start..end].to_vec(),
        next_cursor: (end < total).then_some(end),
        total,
    }
}
