//! Market catalog: which markets to watch and how to subscribe to them.
//!
//! The catalog is a JSON file listing each market with the venue
//! instrument ids that carry its YES and NO prices:
//!
//! ```json
//! {"markets": [
//!   {"venue": "kalshi", "market_id": "KXSB-26-KC", "kind": "prediction",
//!    "title": "Will the Chiefs win Super Bowl LX?", "yes_instrument": "KXSB-26-KC"},
//!   {"venue": "book", "market_id": "sb-kc", "kind": "sportsbook",
//!    "title": "Chiefs to win Super Bowl LX", "yes_instrument": "sb-kc:yes",
//!    "no_instrument": "sb-kc:no"}
//! ]}
//! ```
//!
//! A prediction market with only a YES instrument gets its NO price as the
//! complement. Catalog prices are placeholders; live prices come from the
//! cache.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::feed::Subscription;
use crate::domain::{Market, MarketKind, Side, VenueId};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub venue: String,
    pub market_id: String,
    pub kind: MarketKind,
    pub title: String,
    pub yes_instrument: String,
    #[serde(default)]
    pub no_instrument: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub liquidity: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    markets: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
struct CatalogMarket {
    market: Market,
    subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    markets: Vec<CatalogMarket>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or an entry is invalid.
    #[allow(clippy::result_large_err)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_json(&content)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a market id repeats within
    /// a venue, or a sportsbook entry lacks its NO instrument.
    #[allow(clippy::result_large_err)]
    pub fn parse_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content).map_err(|e| ConfigError::InvalidValue {
            field: "catalog",
            reason: e.to_string(),
        })?;
        Self::from_entries(file.markets, Utc::now())
    }

    /// # Errors
    ///
    /// See [`Catalog::parse_json`].
    #[allow(clippy::result_large_err)]
    pub fn from_entries(entries: Vec<CatalogEntry>, loaded_at: DateTime<Utc>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut markets = Vec::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert((entry.venue.clone(), entry.market_id.clone())) {
                return Err(ConfigError::InvalidValue {
                    field: "catalog",
                    reason: format!("duplicate market {}/{}", entry.venue, entry.market_id),
                }
                .into());
            }
            markets.push(build_entry(entry, loaded_at)?);
        }
        Ok(Self { markets })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Catalog markets with placeholder prices.
    #[must_use]
    pub fn markets(&self) -> Vec<Market> {
        self.markets.iter().map(|m| m.market.clone()).collect()
    }

    /// Subscriptions for every catalog market on `venue`.
    #[must_use]
    pub fn subscriptions(&self, venue: &VenueId) -> Vec<Subscription> {
        self.markets
            .iter()
            .filter(|m| m.market.venue() == venue)
            .flat_map(|m| m.subscriptions.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn venues(&self) -> Vec<VenueId> {
        let mut venues: Vec<VenueId> = self.markets.iter().map(|m| m.market.venue().clone()).collect();
        venues.sort();
        venues.dedup();
        venues
    }
}

#[allow(clippy::result_large_err)]
fn build_entry(entry: CatalogEntry, loaded_at: DateTime<Utc>) -> Result<CatalogMarket> {
    let (yes, no) = match entry.kind {
        MarketKind::Prediction => (dec!(50), dec!(50)),
        MarketKind::Sportsbook => (dec!(2), dec!(2)),
    };
    let mut market = match entry.kind {
        MarketKind::Prediction => {
            Market::prediction(entry.venue.as_str(), entry.market_id.as_str(), entry.title.as_str(), yes, no, loaded_at)?
        }
        MarketKind::Sportsbook => {
            Market::sportsbook(entry.venue.as_str(), entry.market_id.as_str(), entry.title.as_str(), yes, no, loaded_at)?
        }
    };
    if let Some(expires_at) = entry.expires_at {
        market = market.with_expiry(expires_at);
    }
    if let Some(event_start) = entry.event_start {
        market = market.with_event_start(event_start);
    }
    if let Some(volume) = entry.volume {
        market = market.with_volume(volume, entry.liquidity);
    }

    let subscriptions = match (entry.kind, entry.no_instrument) {
        (_, Some(no)) => vec![
            Subscription::side(entry.yes_instrument, &market, Side::Yes),
            Subscription::side(no, &market, Side::No),
        ],
        (MarketKind::Prediction, None) => {
            vec![Subscription::with_complement(entry.yes_instrument, &market)]
        }
        (MarketKind::Sportsbook, None) => {
            return Err(ConfigError::InvalidValue {
                field: "no_instrument",
                reason: format!(
                    "sportsbook market {}/{} needs a NO instrument",
                    entry.venue, entry.market_id
                ),
            }
            .into())
        }
    };
    Ok(CatalogMarket {
        market,
        subscriptions,
    })
}
