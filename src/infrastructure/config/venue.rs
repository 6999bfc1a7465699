//! Venue connection settings.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{FeeSchedule, MarketKind};

/// Wire format spoken by a venue's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Polymarket,
    Kalshi,
    Odds,
}

impl CodecKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polymarket => "polymarket",
            Self::Kalshi => "kalshi",
            Self::Odds => "odds",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[[venues]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub id: String,
    pub kind: MarketKind,
    pub codec: CodecKind,
    pub ws_url: String,
    #[serde(default)]
    pub fee: FeeSchedule,
    /// Available balance in dollars; bounds the per-leg bet with
    /// `scanner.max_bet_pct`. Unbounded when absent.
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
