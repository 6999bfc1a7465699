//! Key-value and log store backends.
//!
//! - [`MemoryStore`] - process-local, for tests and single-process runs
//! - [`FileKvStore`] / [`FileLogStore`] - files under a local directory
//! - [`HttpKvStore`] - REST key-value service shared across processes

mod file;
mod http;
mod memory;

pub use file::{FileKvStore, FileLogStore};
pub use http::{HttpKvStore, KV_TOKEN_ENV};
pub use memory::MemoryStore;
