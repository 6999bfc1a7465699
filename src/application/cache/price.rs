//! The latest known price per (venue, market, outcome).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::domain::{CacheSummary, CachedPrice, LivePriceUpdate, PriceKey, PriceView};

/// Single-owner price table.
///
/// Not shared: the worker's state task owns it and serializes every update
/// through one control path. Ages are computed at read time.
#[derive(Debug, Default)]
pub struct PriceTable {
    entries: HashMap<PriceKey, CachedPrice>,
    total_updates: u64,
}

impl PriceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update, replacing any prior entry for the same key.
    ///
    /// The entry is stamped with the update's own capture time when present,
    /// else `received_at`.
    pub fn update(&mut self, update: LivePriceUpdate, received_at: DateTime<Utc>) {
        let cached = CachedPrice::from_update(update, received_at);
        self.entries.insert(cached.key.clone(), cached);
        self.total_updates += 1;
    }

    #[must_use]
    pub fn get(&self, key: &PriceKey, now: DateTime<Utc>) -> Option<PriceView> {
        self.entries.get(key).map(|price| view(price, now))
    }

    /// Every entry with its age as of `now`, ordered by key.
    #[must_use]
    pub fn all_prices(&self, now: DateTime<Utc>) -> Vec<PriceView> {
        let mut prices: Vec<PriceView> = self.entries.values().map(|p| view(p, now)).collect();
        prices.sort_by(|a, b| a.price.key.cmp(&b.price.key));
        prices
    }

    #[must_use]
    pub fn stats(&self) -> CacheSummary {
        let mut entries_by_venue = BTreeMap::new();
        for key in self.entries.keys() {
            *entries_by_venue.entry(key.venue.clone()).or_insert(0) += 1;
        }
        CacheSummary {
            total_entries: self.entries.len(),
            total_updates: self.total_updates,
            entries_by_venue,
            newest_capture_at: self.entries.values().map(|p| p.captured_at).max(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn view(price: &CachedPrice, now: DateTime<Utc>) -> PriceView {
    PriceView {
        price: price.clone(),
        age_ms: price.age_ms(now),
    }
}
