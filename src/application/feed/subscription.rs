use std::collections::BTreeMap;

use crate::domain::{Market, MarketId, MarketKind, OutcomeId, Side};

/// What one venue instrument quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Venue identifier sent on the wire (token id, ticker, outcome key).
    pub instrument: String,
    pub market_id: MarketId,
    pub kind: MarketKind,
    pub side: Side,
    pub outcome_id: OutcomeId,
    /// Set when the venue reports only this side of a prediction market;
    /// the feed then also writes `100 - price` for the complementary outcome.
    pub complement: Option<OutcomeId>,
}

impl Subscription {
    /// Subscribe to one side of `market` without deriving its complement.
    #[must_use]
    pub fn side(instrument: impl Into<String>, market: &Market, side: Side) -> Self {
        Self {
            instrument: instrument.into(),
            market_id: market.market_id().clone(),
            kind: market.kind(),
            side,
            outcome_id: market.outcome(side).clone(),
            complement: None,
        }
    }

    /// Subscribe to the YES side of a prediction market whose venue reports
    /// only one side.
    #[must_use]
    pub fn with_complement(instrument: impl Into<String>, market: &Market) -> Self {
        let mut subscription = Self::side(instrument, market, Side::Yes);
        if market.kind() == MarketKind::Prediction {
            subscription.complement = Some(market.outcome(Side::No).clone());
        }
        subscription
    }
}

/// Instrument → subscription map. Owned by the feed client task.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    by_instrument: BTreeMap<String, Subscription>,
}

impl SubscriptionSet {
    /// Add subscriptions; returns the instruments that were not already present.
    pub fn insert_all(&mut self, subscriptions: Vec<Subscription>) -> Vec<String> {
        let mut added = Vec::new();
        for subscription in subscriptions {
            let instrument = subscription.instrument.clone();
            if self.by_instrument.insert(instrument.clone(), subscription).is_none() {
                added.push(instrument);
            }
        }
        added
    }

    /// Remove instruments; returns those that were present.
    pub fn remove_all(&mut self, instruments: &[String]) -> Vec<String> {
        instruments
            .iter()
            .filter(|i| self.by_instrument.remove(*i).is_some())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, instrument: &str) -> Option<&Subscription> {
        self.by_instrument.get(instrument)
    }

    #[must_use]
    pub fn instruments(&self) -> Vec<String> {
        self.by_instrument.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_instrument.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_instrument.is_empty()
    }
}
