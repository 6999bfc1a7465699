//! Market snapshots across both pricing models.
//!
//! - [`Market`] - An immutable price snapshot of one binary market on one venue
//! - [`MarketKind`] - Prediction contract (cents) or sportsbook line (decimal odds)
//! - [`Side`] - The YES/NO side of a binary market

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OutcomeId, VenueId};

const CENTS: Decimal = Decimal::ONE_HUNDRED;

/// Pricing model of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// Binary contract quoted in cents (0-100), paying $1 per contract.
    Prediction,
    /// Fixed-odds line quoted as decimal odds (> 1.0).
    Sportsbook,
}

impl MarketKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::Sportsbook => "sportsbook",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary market on one venue at one instant.
///
/// Prices are venue-native: cents for [`MarketKind::Prediction`], decimal odds
/// for [`MarketKind::Sportsbook`]. A snapshot is never mutated; a newer quote
/// produces a new value via [`Market::with_quote`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    venue: VenueId,
    market_id: MarketId,
    kind: MarketKind,
    title: String,
    yes_outcome: OutcomeId,
    no_outcome: OutcomeId,
    yes_price: Decimal,
    no_price: Decimal,
    odds_as_of: DateTime<Utc>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    event_start: Option<DateTime<Utc>>,
    #[serde(default)]
    volume: Option<Decimal>,
    #[serde(default)]
    liquidity: Option<Decimal>,
    #[serde(default)]
    yes_spread: Option<Decimal>,
    #[serde(default)]
    no_spread: Option<Decimal>,
    #[serde(default)]
    yes_as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    no_as_of: Option<DateTime<Utc>>,
}

impl Market {
    /// Create a prediction-market snapshot with validated cent prices.
    ///
    /// Outcome ids default to `{market_id}:yes` / `{market_id}:no`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PriceOutOfRange`] if either price is outside `0..=100`.
    pub fn prediction(
        venue: impl Into<VenueId>,
        market_id: impl Into<MarketId>,
        title: impl Into<String>,
        yes_cents: Decimal,
        no_cents: Decimal,
        odds_as_of: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_price(MarketKind::Prediction, yes_cents)?;
        validate_price(MarketKind::Prediction, no_cents)?;
        Ok(Self::unchecked(
            venue.into(),
            market_id.into(),
            MarketKind::Prediction,
            title.into(),
            yes_cents,
            no_cents,
            odds_as_of,
        ))
    }

    /// Create a sportsbook snapshot with validated decimal odds.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidOdds`] if either side's odds are `<= 1.0`.
    pub fn sportsbook(
        venue: impl Into<VenueId>,
        market_id: impl Into<MarketId>,
        title: impl Into<String>,
        yes_odds: Decimal,
        no_odds: Decimal,
        odds_as_of: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_price(MarketKind::Sportsbook, yes_odds)?;
        validate_price(MarketKind::Sportsbook, no_odds)?;
        Ok(Self::unchecked(
            venue.into(),
            market_id.into(),
            MarketKind::Sportsbook,
            title.into(),
            yes_odds,
            no_odds,
            odds_as_of,
        ))
    }

    fn unchecked(
        venue: VenueId,
        market_id: MarketId,
        kind: MarketKind,
        title: String,
        yes_price: Decimal,
        no_price: Decimal,
        odds_as_of: DateTime<Utc>,
    ) -> Self {
        let yes_outcome = OutcomeId::new(format!("{market_id}:yes"));
        let no_outcome = OutcomeId::new(format!("{market_id}:no"));
        Self {
            venue,
            market_id,
            kind,
            title,
            yes_outcome,
            no_outcome,
            yes_price,
            no_price,
            odds_as_of,
            expires_at: None,
            event_start: None,
            volume: None,
            liquidity: None,
            yes_spread: None,
            no_spread: None,
            yes_as_of: None,
            no_as_of: None,
        }
    }

    /// Replace the venue outcome identifiers.
    #[must_use]
    pub fn with_outcomes(mut self, yes: impl Into<OutcomeId>, no: impl Into<OutcomeId>) -> Self {
        self.yes_outcome = yes.into();
        self.no_outcome = no.into();
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_event_start(mut self, event_start: DateTime<Utc>) -> Self {
        self.event_start = Some(event_start);
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: Decimal, liquidity: Option<Decimal>) -> Self {
        self.volume = Some(volume);
        self.liquidity = liquidity;
        self
    }

    /// Attach top-of-book spreads (venue-native units) per side.
    #[must_use]
    pub fn with_spreads(mut self, yes: Option<Decimal>, no: Option<Decimal>) -> Self {
        self.yes_spread = yes;
        self.no_spread = no;
        self
    }

    /// Record when each side's price was captured. `odds_as_of` becomes the
    /// older of the two.
    #[must_use]
    pub fn with_capture_times(mut self, yes: DateTime<Utc>, no: DateTime<Utc>) -> Self {
        self.yes_as_of = Some(yes);
        self.no_as_of = Some(no);
        self.odds_as_of = yes.min(no);
        self
    }

    /// Produce a newer snapshot of the same market with fresh prices.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the new prices are invalid for this kind.
    pub fn with_quote(
        &self,
        yes_price: Decimal,
        no_price: Decimal,
        odds_as_of: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_price(self.kind, yes_price)?;
        validate_price(self.kind, no_price)?;
        let mut next = self.clone();
        next.yes_price = yes_price;
        next.no_price = no_price;
        next.odds_as_of = odds_as_of;
        next.yes_as_of = None;
        next.no_as_of = None;
        Ok(next)
    }

    #[must_use]
    pub const fn venue(&self) -> &VenueId {
        &self.venue
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn kind(&self) -> MarketKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn outcome(&self, side: Side) -> &OutcomeId {
        match side {
            Side::Yes => &self.yes_outcome,
            Side::No => &self.no_outcome,
        }
    }

    /// Venue-native price for a side (cents or decimal odds).
    #[must_use]
    pub const fn price(&self, side: Side) -> Decimal {
        match side {
            Side::Yes => self.yes_price,
            Side::No => self.no_price,
        }
    }

    /// Price expressed as a 0-1 probability.
    ///
    /// Prediction: `price / 100`. Sportsbook: `1 / odds`.
    #[must_use]
    pub fn implied_probability(&self, side: Side) -> Decimal {
        implied_probability(self.kind, self.price(side))
    }

    #[must_use]
    pub const fn spread(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Yes => self.yes_spread,
            Side::No => self.no_spread,
        }
    }

    #[must_use]
    pub const fn odds_as_of(&self) -> DateTime<Utc> {
        self.odds_as_of
    }

    /// Capture time of one side's price, falling back to `odds_as_of`.
    #[must_use]
    pub fn side_as_of(&self, side: Side) -> DateTime<Utc> {
        let captured = match side {
            Side::Yes => self.yes_as_of,
            Side::No => self.no_as_of,
        };
        captured.unwrap_or(self.odds_as_of)
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[must_use]
    pub const fn event_start(&self) -> Option<DateTime<Utc>> {
        self.event_start
    }

    #[must_use]
    pub const fn volume(&self) -> Option<Decimal> {
        self.volume
    }

    #[must_use]
    pub const fn liquidity(&self) -> Option<Decimal> {
        self.liquidity
    }

    /// Whether the market has expired as of `now`.
    #[must_use]
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// Convert a venue-native price into a 0-1 probability.
#[must_use]
pub fn implied_probability(kind: MarketKind, price: Decimal) -> Decimal {
    match kind {
        MarketKind::Prediction => price / CENTS,
        MarketKind::Sportsbook => {
            if price.is_zero() {
                Decimal::ZERO
            } else {
                Decimal::ONE / price
            }
        }
    }
}

fn validate_price(kind: MarketKind, price: Decimal) -> Result<(), DomainError> {
    match kind {
        MarketKind::Prediction if price < Decimal::ZERO || price > CENTS => {
            Err(DomainError::PriceOutOfRange { price })
        }
        MarketKind::Sportsbook if price <= Decimal::ONE => Err(DomainError::InvalidOdds { odds: price }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn prediction_rejects_prices_above_one_hundred() {
        let result = Market::prediction("kalshi", "m", "t", dec!(101), dec!(0), Utc::now());
        assert!(matches!(result, Err(DomainError::PriceOutOfRange { .. })));
    }

    #[test]
    fn sportsbook_rejects_odds_at_or_below_one() {
        let result = Market::sportsbook("book", "m", "t", dec!(1.0), dec!(2.0), Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidOdds { .. })));
    }

    #[test]
    fn implied_probability_follows_pricing_model() {
        let now = Utc::now();
        let p = Market::prediction("kalshi", "m", "t", dec!(35), dec!(65), now).unwrap();
        assert_eq!(p.implied_probability(Side::Yes), dec!(0.35));

        let s = Market::sportsbook("book", "m", "t", dec!(2.5), dec!(1.6), now).unwrap();
        assert_eq!(s.implied_probability(Side::Yes), dec!(0.4));
        assert_eq!(s.implied_probability(Side::No), dec!(0.625));
    }

    #[test]
    fn with_quote_keeps_identity_and_replaces_prices() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(5);
        let market = Market::prediction("kalshi", "m", "t", dec!(40), dec!(60), t0)
            .unwrap()
            .with_outcomes("y", "n");
        let next = market.with_quote(dec!(42), dec!(58), t1).unwrap();

        assert_eq!(market.price(Side::Yes), dec!(40));
        assert_eq!(next.price(Side::Yes), dec!(42));
        assert_eq!(next.outcome(Side::No).as_str(), "n");
        assert_eq!(next.odds_as_of(), t1);
    }

    #[test]
    fn capture_times_are_tracked_per_side() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(5);
        let market = Market::prediction("kalshi", "m", "t", dec!(40), dec!(60), t0).unwrap();
        assert_eq!(market.side_as_of(Side::No), t0);

        let split = market.clone().with_capture_times(t1, t0);
        assert_eq!(split.side_as_of(Side::Yes), t1);
        assert_eq!(split.side_as_of(Side::No), t0);
        assert_eq!(split.odds_as_of(), t0);

        let requoted = split.with_quote(dec!(41), dec!(59), t1).unwrap();
        assert_eq!(requoted.side_as_of(Side::No), t1);
    }

    #[test]
    fn side_opposite_flips() {
        assert_eq!(Side::Yes.opposite(), Side::No);
        assert_eq!(Side::No.opposite(), Side::Yes);
    }
}
