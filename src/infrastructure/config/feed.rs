//! Feed client reconnection and keepalive settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::feed::{Backoff, FeedClientConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Delay before the first reconnect (milliseconds).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the reconnect delay (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Reconnect attempts before the client gives up and enters `error`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Capacity of the state owner's inbound channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            ping_interval_secs: default_ping_interval_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub fn client_config(&self) -> FeedClientConfig {
        FeedClientConfig {
            backoff: Backoff::new(
                Duration::from_millis(self.base_delay_ms),
                Duration::from_millis(self.max_delay_ms),
            ),
            max_attempts: self.max_attempts,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            ..FeedClientConfig::default()
        }
    }
}
