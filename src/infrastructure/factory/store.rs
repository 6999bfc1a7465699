//! Store backend construction.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::outbound::store::{FileKvStore, FileLogStore, HttpKvStore, MemoryStore};
use crate::error::StorageError;
use crate::infrastructure::config::store::StoreKind;
use crate::infrastructure::config::Config;
use crate::port::outbound::store::{KvStore, LogStore};

/// The two store handles every runtime component shares.
#[derive(Clone)]
pub struct Stores {
    pub kv: Arc<dyn KvStore>,
    pub logs: Arc<dyn LogStore>,
}

/// Build the configured backend.
///
/// # Errors
///
/// Returns [`StorageError::Misconfigured`] when the HTTP backend lacks its
/// URL or token.
pub fn build_stores(config: &Config) -> Result<Stores, StorageError> {
    let timeout = Duration::from_millis(config.store.timeout_ms);
    match config.store.kind {
        StoreKind::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok(Stores {
                kv: store.clone(),
                logs: store,
            })
        }
        StoreKind::File => Ok(Stores {
            kv: Arc::new(FileKvStore::new(config.store.path.clone())),
            logs: Arc::new(FileLogStore::new(config.journal.dir.clone())),
        }),
        StoreKind::Http => {
            let store = Arc::new(HttpKvStore::from_env(config.store.url.as_deref(), timeout)?);
            Ok(Stores {
                kv: store.clone(),
                logs: store,
            })
        }
    }
}
