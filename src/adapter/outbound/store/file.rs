//! File-backed stores.
//!
//! Keys live as one file each under a directory and are replaced through a
//! temporary file plus rename, so a concurrent reader sees either the old
//! value or the new one. Logs are JSON-lines files at
//! `{dir}/{stream}/{date}.jsonl`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::port::outbound::store::{page_of, KvStore, LogPage, LogStore};

const LOG_EXTENSION: &str = "jsonl";

/// Key-value store over a directory of files.
#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_name(key)))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Append-only log over JSON-lines files.
#[derive(Debug)]
pub struct FileLogStore {
    dir: PathBuf,
    // Serializes appends within this process.
    write: Mutex<()>,
}

impl FileLogStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stream_dir(&self, stream: &str) -> PathBuf {
        self.dir.join(file_name(stream))
    }

    fn path(&self, stream: &str, date: &str) -> PathBuf {
        self.stream_dir(stream)
            .join(format!("{}.{LOG_EXTENSION}", file_name(date)))
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn append(&self, stream: &str, date: &str, record: &str) -> Result<(), StorageError> {
        if record.contains('\n') {
            return Err(StorageError::Serialization(
                "record contains a newline".to_string(),
            ));
        }
        let _guard = self.write.lock().await;
        fs::create_dir_all(self.stream_dir(stream)).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(stream, date))
            .await?;
        let mut line = String::with_capacity(record.len() + 1);
        line.push_str(record);
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_page(
        &self,
        stream: &str,
        date: &str,
        cursor: usize,
        limit: usize,
    ) -> Result<LogPage, StorageError> {
        let records = self.read_all(stream, date).await?;
        Ok(page_of(&records, cursor, limit))
    }

    async fn read_all(&self, stream: &str, date: &str) -> Result<Vec<String>, StorageError> {
        match fs::read_to_string(self.path(stream, date)).await {
            Ok(content) => Ok(content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn dates(&self, stream: &str) -> Result<Vec<String>, StorageError> {
        let mut entries = match fs::read_dir(self.stream_dir(stream)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                dates.push(stem.to_string());
            }
        }
        dates.sort();
        Ok(dates)
    }
}

/// Map a key to a safe single path component.
fn file_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn kv_round_trips_and_replaces() {
        let dir = TempDir::new().unwrap();
        let store = FileKvStore::new(dir.path());
        assert_eq!(store.get("worker:heartbeat").await.unwrap(), None);

        store.set("worker:heartbeat", "{\"tick\":1}").await.unwrap();
        store.set("worker:heartbeat", "{\"tick\":2}").await.unwrap();
        assert_eq!(
            store.get("worker:heartbeat").await.unwrap().as_deref(),
            Some("{\"tick\":2}")
        );
        assert!(dir.path().join("worker_heartbeat.json").exists());
    }

    #[tokio::test]
    async fn log_appends_lines_and_lists_dates() {
        let dir = TempDir::new().unwrap();
        let store = FileLogStore::new(dir.path());
        store.append("dry-fire", "2025-03-02", "{\"n\":2}").await.unwrap();
        store.append("dry-fire", "2025-03-01", "{\"n\":1}").await.unwrap();
        store.append("dry-fire", "2025-03-02", "{\"n\":3}").await.unwrap();

        assert_eq!(store.dates("dry-fire").await.unwrap(), vec!["2025-03-01", "2025-03-02"]);
        let page = store.read_page("dry-fire", "2025-03-02", 1, 10).await.unwrap();
        assert_eq!(page.records, vec!["{\"n\":3}"]);
        assert_eq!(page.total, 2);
        assert!(store.dates("opportunities").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn multi_line_records_are_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileLogStore::new(dir.path());
        let err = store.append("s", "2025-01-01", "a\nb").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
