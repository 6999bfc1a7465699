//! Detected cross-venue arbitrage opportunities.
//!
//! Every opportunity carries the capture timestamp of both legs so that
//! simultaneity can be audited after the fact; detection time alone is
//! never enough.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OpportunityId, OutcomeId, VenueId};
use super::market::{Market, MarketKind, Side};

/// One position of an arbitrage pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityLeg {
    pub venue: VenueId,
    pub market_id: MarketId,
    pub outcome_id: OutcomeId,
    pub kind: MarketKind,
    pub title: String,
    pub side: Side,
    /// Venue-native price used for the leg.
    pub price: Decimal,
    pub implied_probability: Decimal,
    /// Dollars committed to the leg, fees included.
    pub stake: Decimal,
    pub fee: Decimal,
    /// Contract count for prediction legs; always 1 for sportsbook legs.
    pub quantity: Decimal,
    pub odds_as_of: DateTime<Utc>,
    /// Age of the quote relative to detection time.
    pub age_ms: i64,
    #[serde(default)]
    pub spread: Option<Decimal>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OpportunityLeg {
    /// Build a leg from a market snapshot; stake and quantity are filled in by
    /// the calculator.
    #[must_use]
    pub fn from_market(market: &Market, side: Side, detected_at: DateTime<Utc>) -> Self {
        Self {
            venue: market.venue().clone(),
            market_id: market.market_id().clone(),
            outcome_id: market.outcome(side).clone(),
            kind: market.kind(),
            title: market.title().to_string(),
            side,
            price: market.price(side),
            implied_probability: market.implied_probability(side),
            stake: Decimal::ZERO,
            fee: Decimal::ZERO,
            quantity: Decimal::ZERO,
            odds_as_of: market.side_as_of(side),
            age_ms: (detected_at - market.side_as_of(side)).num_milliseconds(),
            spread: market.spread(side),
            expires_at: market.expires_at(),
        }
    }
}

/// A validated, fee-aware arbitrage between two legs on different venues.
///
/// Construct through [`ArbitrageOpportunity::try_new`], which enforces
/// `guaranteed_return > total_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    id: OpportunityId,
    leg_a: OpportunityLeg,
    leg_b: OpportunityLeg,
    total_cost: Decimal,
    guaranteed_return: Decimal,
    /// Percent return on cost.
    profit_margin: Decimal,
    expected_profit: Decimal,
    match_score: f64,
    detected_at: DateTime<Utc>,
    time_skew_ms: i64,
}

impl ArbitrageOpportunity {
    /// Create an opportunity from two sized legs.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PayoutNotGreaterThanCost`] when the pair does not
    /// return more than it costs.
    pub fn try_new(
        leg_a: OpportunityLeg,
        leg_b: OpportunityLeg,
        guaranteed_return: Decimal,
        match_score: f64,
        detected_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let total_cost = leg_a.stake + leg_b.stake;
        if guaranteed_return <= total_cost || total_cost <= Decimal::ZERO {
            return Err(DomainError::PayoutNotGreaterThanCost {
                payout: guaranteed_return,
                cost: total_cost,
            });
        }
        let expected_profit = guaranteed_return - total_cost;
        let profit_margin = expected_profit / total_cost * Decimal::ONE_HUNDRED;
        let time_skew_ms = (leg_a.odds_as_of - leg_b.odds_as_of).num_milliseconds().abs();

        Ok(Self {
            id: OpportunityId::new(),
            leg_a,
            leg_b,
            total_cost,
            guaranteed_return,
            profit_margin,
            expected_profit,
            match_score,
            detected_at,
            time_skew_ms,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &OpportunityId {
        &self.id
    }

    #[must_use]
    pub const fn leg_a(&self) -> &OpportunityLeg {
        &self.leg_a
    }

    #[must_use]
    pub const fn leg_b(&self) -> &OpportunityLeg {
        &self.leg_b
    }

    #[must_use]
    pub fn legs(&self) -> [&OpportunityLeg; 2] {
        [&self.leg_a, &self.leg_b]
    }

    #[must_use]
    pub const fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    #[must_use]
    pub const fn guaranteed_return(&self) -> Decimal {
        self.guaranteed_return
    }

    #[must_use]
    pub const fn profit_margin(&self) -> Decimal {
        self.profit_margin
    }

    #[must_use]
    pub const fn expected_profit(&self) -> Decimal {
        self.expected_profit
    }

    #[must_use]
    pub const fn match_score(&self) -> f64 {
        self.match_score
    }

    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// `|asOfA − asOfB|` in milliseconds.
    #[must_use]
    pub const fn time_skew_ms(&self) -> i64 {
        self.time_skew_ms
    }

    /// Age of the older leg at detection time.
    #[must_use]
    pub fn max_age_ms(&self) -> i64 {
        self.leg_a.age_ms.max(self.leg_b.age_ms)
    }

    /// Sum of both legs' implied probabilities.
    #[must_use]
    pub fn combined_implied_probability(&self) -> Decimal {
        self.leg_a.implied_probability + self.leg_b.implied_probability
    }

    /// Whether either leg is on the given venue.
    #[must_use]
    pub fn involves(&self, venue: &VenueId) -> bool {
        &self.leg_a.venue == venue || &self.leg_b.venue == venue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(venue: &str, stake: Decimal, as_of: DateTime<Utc>) -> OpportunityLeg {
        let market = Market::prediction(venue, "m", "t", dec!(40), dec!(60), as_of).unwrap();
        let mut leg = OpportunityLeg::from_market(&market, Side::Yes, as_of);
        leg.stake = stake;
        leg
    }

    #[test]
    fn margin_and_skew_are_derived() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::milliseconds(200);
        let opp = ArbitrageOpportunity::try_new(
            leg("a", dec!(35), t0),
            leg("b", dec!(30), t1),
            dec!(100),
            0.9,
            t1,
        )
        .unwrap();

        assert_eq!(opp.total_cost(), dec!(65));
        assert_eq!(opp.expected_profit(), dec!(35));
        assert_eq!(opp.time_skew_ms(), 200);
        assert!(opp.profit_margin() > dec!(53) && opp.profit_margin() < dec!(54));
    }

    #[test]
    fn rejects_pairs_that_do_not_return_more_than_cost() {
        let now = Utc::now();
        let result = ArbitrageOpportunity::try_new(
            leg("a", dec!(50), now),
            leg("b", dec!(50), now),
            dec!(100),
            1.0,
            now,
        );
        assert!(matches!(
            result,
            Err(DomainError::PayoutNotGreaterThanCost { .. })
        ));
    }
}
