//! Runtime feature flags.
//!
//! Operators write a small JSON document under one key in the shared store;
//! the worker re-reads it every scan cycle and never writes it. Anything
//! missing, unreadable or malformed falls back to defaults.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::port::outbound::store::KvStore;

pub const DEFAULT_FLAGS_KEY: &str = "worker:runtime-config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeFlags {
    /// Run cross-venue matching and scanning at all.
    pub matcher_enabled: bool,
    /// Restrict event groups to sports.
    pub sports_only: bool,
    pub dry_fire_enabled: bool,
    /// Overrides `scanner.min_profit_margin` when set.
    pub min_profit_margin: Option<Decimal>,
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self {
            matcher_enabled: true,
            sports_only: false,
            dry_fire_enabled: true,
            min_profit_margin: None,
        }
    }
}

impl RuntimeFlags {
    /// Decode a raw flags document.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(raw) {
            Ok(flags) if flags.min_profit_margin.map_or(true, |m| m >= Decimal::ZERO) => flags,
            Ok(_) => {
                warn!("Ignoring runtime flags with negative min_profit_margin");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Malformed runtime flags, using defaults");
                Self::default()
            }
        }
    }

    /// Read flags from the store, bounded by `timeout`.
    pub async fn load(store: &dyn KvStore, key: &str, timeout: Duration) -> Self {
        match tokio::time::timeout(timeout, store.get(key)).await {
            Ok(Ok(raw)) => Self::parse(raw.as_deref()),
            Ok(Err(e)) => {
                debug!(error = %e, key, "Runtime flags unavailable");
                Self::default()
            }
            Err(_) => {
                debug!(key, "Runtime flags read timed out");
                Self::default()
            }
        }
    }

    /// The margin to scan with given the configured one.
    #[must_use]
    pub fn min_profit_margin_or(&self, configured: Decimal) -> Decimal {
        self.min_profit_margin.unwrap_or(configured)
    }
}
