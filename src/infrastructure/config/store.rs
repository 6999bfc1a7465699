//! Shared store and journal settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::infrastructure::flags::DEFAULT_FLAGS_KEY;

/// Backend behind the key-value store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local; nothing outside the worker can read it.
    Memory,
    #[default]
    File,
    Http,
}

/// `[store]` section. The HTTP token is read from the environment only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    /// Directory for the file backend.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Base URL for the HTTP backend.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Runtime flags key, read by the worker and never written.
    #[serde(default = "default_flags_key")]
    pub flags_key: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".crossbook/kv")
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_flags_key() -> String {
    DEFAULT_FLAGS_KEY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
            url: None,
            timeout_ms: default_timeout_ms(),
            flags_key: default_flags_key(),
        }
    }
}

/// `[journal]` section. Used by the file backend; the HTTP backend keeps
/// journals in the same service as the key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_dir")]
    pub dir: PathBuf,
}

fn default_journal_dir() -> PathBuf {
    PathBuf::from(".crossbook/journal")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: default_journal_dir(),
        }
    }
}
