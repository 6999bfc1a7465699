//! Live price records held by the price cache.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OutcomeId, VenueId};

/// Where a price observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Websocket,
    Rest,
    Snapshot,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Websocket => "websocket",
            Self::Rest => "rest",
            Self::Snapshot => "snapshot",
        })
    }
}

/// Cache key: exactly one current price per (venue, market, outcome).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceKey {
    pub venue: VenueId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
}

impl PriceKey {
    pub fn new(
        venue: impl Into<VenueId>,
        market_id: impl Into<MarketId>,
        outcome_id: impl Into<OutcomeId>,
    ) -> Self {
        Self {
            venue: venue.into(),
            market_id: market_id.into(),
            outcome_id: outcome_id.into(),
        }
    }
}

/// A single price observation pushed into the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePriceUpdate {
    pub key: PriceKey,
    /// Venue-native price (cents or decimal odds).
    pub price: Decimal,
    pub implied_probability: Decimal,
    pub source: PriceSource,
    /// Capture time reported by the venue, if any.
    pub captured_at: Option<DateTime<Utc>>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub spread: Option<Decimal>,
}

impl LivePriceUpdate {
    pub fn new(key: PriceKey, price: Decimal, implied_probability: Decimal, source: PriceSource) -> Self {
        Self {
            key,
            price,
            implied_probability,
            source,
            captured_at: None,
            best_bid: None,
            best_ask: None,
            spread: None,
        }
    }

    #[must_use]
    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Attach top-of-book metadata; spread is derived when both sides exist.
    #[must_use]
    pub fn with_book(mut self, best_bid: Option<Decimal>, best_ask: Option<Decimal>) -> Self {
        self.best_bid = best_bid;
        self.best_ask = best_ask;
        self.spread = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        };
        self
    }
}

/// A stored cache entry. The capture time is always resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrice {
    pub key: PriceKey,
    pub price: Decimal,
    pub implied_probability: Decimal,
    pub source: PriceSource,
    pub captured_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub spread: Option<Decimal>,
}

impl CachedPrice {
    /// Resolve an update into a stored entry, falling back to the local
    /// receive time when the venue did not supply a capture time.
    #[must_use]
    pub fn from_update(update: LivePriceUpdate, received_at: DateTime<Utc>) -> Self {
        Self {
            captured_at: update.captured_at.unwrap_or(received_at),
            key: update.key,
            price: update.price,
            implied_probability: update.implied_probability,
            source: update.source,
            received_at,
            best_bid: update.best_bid,
            best_ask: update.best_ask,
            spread: update.spread,
        }
    }

    /// Milliseconds elapsed since capture, as seen at `now`.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.captured_at).num_milliseconds()
    }
}

/// A cache entry paired with its age at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceView {
    #[serde(flatten)]
    pub price: CachedPrice,
    pub age_ms: i64,
}
