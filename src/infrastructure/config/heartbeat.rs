//! Heartbeat publication and status-read settings.

use serde::{Deserialize, Serialize};

use crate::application::heartbeat::DEFAULT_HEARTBEAT_KEY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Heartbeat age beyond which readers treat the worker as absent.
    #[serde(default = "default_stale_ms")]
    pub stale_ms: i64,
    /// Message age beyond which readers mark a venue stale.
    #[serde(default = "default_stale_ms")]
    pub venue_stale_ms: i64,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_stale_ms() -> i64 {
    30_000
}

fn default_key() -> String {
    DEFAULT_HEARTBEAT_KEY.to_string()
}

fn default_timeout_ms() -> u64 {
    3_000
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            stale_ms: default_stale_ms(),
            venue_stale_ms: default_stale_ms(),
            key: default_key(),
            read_timeout_ms: default_timeout_ms(),
            write_timeout_ms: default_timeout_ms(),
        }
    }
}
