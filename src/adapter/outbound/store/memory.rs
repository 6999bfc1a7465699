use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::port::outbound::store::{page_of, partition_key, KvStore, LogPage, LogStore};

/// In-memory [`KvStore`] and [`LogStore`].
///
/// Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    logs: HashMap<String, Vec<String>>,
    dates: HashMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .lock()
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn append(&self, stream: &str, date: &str, record: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner
            .logs
            .entry(partition_key(stream, date))
            .or_default()
            .push(record.to_string());
        inner
            .dates
            .entry(stream.to_string())
            .or_default()
            .insert(date.to_string());
        Ok(())
    }

    async fn read_page(
        &self,
        stream: &str,
        date: &str,
        cursor: usize,
        limit: usize,
    ) -> Result<LogPage, StorageError> {
        let inner = self.inner.lock();
        let records = inner
            .logs
            .get(&partition_key(stream, date))
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(page_of(records, cursor, limit))
    }

    async fn read_all(&self, stream: &str, date: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .inner
            .lock()
            .logs
            .get(&partition_key(stream, date))
            .cloned()
            .unwrap_or_default())
    }

    async fn dates(&self, stream: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .inner
            .lock()
            .dates
            .get(stream)
            .map(|dates| dates.iter().cloned().collect())
            .unwrap_or_default())
    }
}
