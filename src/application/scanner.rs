//! Opportunity scanner.
//!
//! Pairs matched markets across venues, prices both hedging side
//! combinations, and emits every profitable result annotated with leg ages
//! and inter-leg skew. Nothing is dropped for staleness here; the dry-fire
//! simulator and the breaker decide what is executable.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::application::calculator::{ArbitrageCalculator, ArbitrageComputation, LegInput, LegStake};
use crate::application::matcher::{MarketMatcher, MatchScore, ParsedMarket};
use crate::domain::{
    ArbitrageOpportunity, FeeSchedule, Market, MatchedEventGroup, OpportunityLeg, Side, VenueId,
};

/// Per-venue pricing inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VenueProfile {
    pub fee: FeeSchedule,
    /// `balance × max_bet_pct`; `None` means unbounded.
    pub max_bet: Option<Decimal>,
}

pub struct OpportunityScanner {
    calculator: ArbitrageCalculator,
    venues: HashMap<VenueId, VenueProfile>,
}

impl OpportunityScanner {
    #[must_use]
    pub fn new(calculator: ArbitrageCalculator) -> Self {
        Self {
            calculator,
            venues: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_venue(mut self, venue: impl Into<VenueId>, profile: VenueProfile) -> Self {
        self.venues.insert(venue.into(), profile);
        self
    }

    fn profile(&self, venue: &VenueId) -> VenueProfile {
        self.venues.get(venue).copied().unwrap_or_default()
    }

    /// Scan every pairing of `markets_a` against `markets_b`.
    #[must_use]
    pub fn scan(
        &self,
        matcher: &MarketMatcher,
        markets_a: &[Market],
        markets_b: &[Market],
        min_profit_margin: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        let a: Vec<&Market> = markets_a.iter().collect();
        let b: Vec<&Market> = markets_b.iter().collect();
        self.scan_refs(matcher, &a, &b, min_profit_margin, now)
    }

    /// Scan every cross-venue pairing of a mixed market list.
    #[must_use]
    pub fn scan_all(
        &self,
        matcher: &MarketMatcher,
        markets: &[Market],
        min_profit_margin: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        let mut by_venue: BTreeMap<&VenueId, Vec<&Market>> = BTreeMap::new();
        for market in markets {
            by_venue.entry(market.venue()).or_default().push(market);
        }
        let venues: Vec<&Vec<&Market>> = by_venue.values().collect();

        let mut found = Vec::new();
        for (i, a) in venues.iter().enumerate() {
            for b in &venues[i + 1..] {
                found.extend(self.scan_refs(matcher, a, b, min_profit_margin, now));
            }
        }
        found
    }

    /// Scan cross-venue pairs within one matched event group.
    #[must_use]
    pub fn scan_group(
        &self,
        matcher: &MarketMatcher,
        group: &MatchedEventGroup,
        min_profit_margin: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        self.scan_all(matcher, &group.markets, min_profit_margin, now)
    }

    fn scan_refs(
        &self,
        matcher: &MarketMatcher,
        markets_a: &[&Market],
        markets_b: &[&Market],
        min_profit_margin: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        let parsed_b: Vec<ParsedMarket> = markets_b.iter().map(|m| matcher.parse(m.title())).collect();

        let mut found = Vec::new();
        for a in markets_a.iter().filter(|m| !m.is_closed(now)) {
            let parsed_a = matcher.parse(a.title());
            for (b, parsed) in markets_b.iter().zip(&parsed_b) {
                if a.venue() == b.venue() || b.is_closed(now) {
                    continue;
                }
                let score = matcher.compare(&parsed_a, parsed);
                if !matcher.is_match(&score) {
                    continue;
                }
                found.extend(self.evaluate_pair(a, b, &score, min_profit_margin, now));
            }
        }
        found
    }

    /// Price both hedging side combinations of an already-matched pair.
    #[must_use]
    pub fn evaluate_pair(
        &self,
        a: &Market,
        b: &Market,
        score: &MatchScore,
        min_profit_margin: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        let combos = if score.flipped {
            [(Side::Yes, Side::Yes), (Side::No, Side::No)]
        } else {
            [(Side::Yes, Side::No), (Side::No, Side::Yes)]
        };
        let profile_a = self.profile(a.venue());
        let profile_b = self.profile(b.venue());

        combos
            .into_iter()
            .filter_map(|(side_a, side_b)| {
                let leg_a = LegInput::new(a, side_a, profile_a.fee);
                let leg_b = LegInput::new(b, side_b, profile_b.fee);
                let full = self.calculator.compute_arbitrage(&leg_a, &leg_b);
                if !full.is_profitable() {
                    return None;
                }
                let sized = self.calculator.size(
                    &leg_a,
                    &leg_b,
                    &full,
                    profile_a.max_bet,
                    profile_b.max_bet,
                );
                if !sized.is_profitable() || sized.profit_margin < min_profit_margin {
                    debug!(
                        venue_a = %a.venue(),
                        venue_b = %b.venue(),
                        margin = %sized.profit_margin,
                        "Pair below minimum margin"
                    );
                    return None;
                }
                build(a, side_a, b, side_b, &sized, score.score, now)
            })
            .collect()
    }
}

fn build(
    a: &Market,
    side_a: Side,
    b: &Market,
    side_b: Side,
    computation: &ArbitrageComputation,
    match_score: f64,
    now: DateTime<Utc>,
) -> Option<ArbitrageOpportunity> {
    let leg_a = sized_leg(a, side_a, computation.leg_a, now);
    let leg_b = sized_leg(b, side_b, computation.leg_b, now);
    let opportunity =
        ArbitrageOpportunity::try_new(leg_a, leg_b, computation.guaranteed_return, match_score, now)
            .ok()?;

    info!(
        id = %opportunity.id(),
        venue_a = %opportunity.leg_a().venue,
        side_a = %side_a,
        venue_b = %opportunity.leg_b().venue,
        side_b = %side_b,
        margin = %opportunity.profit_margin().round_dp(2),
        profit = %opportunity.expected_profit().round_dp(2),
        age_ms_a = opportunity.leg_a().age_ms,
        age_ms_b = opportunity.leg_b().age_ms,
        time_skew_ms = opportunity.time_skew_ms(),
        "Opportunity detected"
    );
    Some(opportunity)
}

fn sized_leg(market: &Market, side: Side, stake: LegStake, now: DateTime<Utc>) -> OpportunityLeg {
    let mut leg = OpportunityLeg::from_market(market, side, now);
    leg.stake = stake.stake;
    leg.fee = stake.fee;
    leg.quantity = stake.quantity;
    leg
}
