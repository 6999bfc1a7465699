//! Paper-trading decision records.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OpportunityId, VenueId};
use super::opportunity::{ArbitrageOpportunity, OpportunityLeg};

/// Outcome of a simulated execution decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DryFireStatus {
    Simulated,
    RejectedBySafety,
    RejectedByRisk,
    RejectedByValidation,
}

impl DryFireStatus {
    pub const ALL: [Self; 4] = [
        Self::Simulated,
        Self::RejectedBySafety,
        Self::RejectedByRisk,
        Self::RejectedByValidation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "SIMULATED",
            Self::RejectedBySafety => "REJECTED_BY_SAFETY",
            Self::RejectedByRisk => "REJECTED_BY_RISK",
            Self::RejectedByValidation => "REJECTED_BY_VALIDATION",
        }
    }

    /// Parse a status name, accepting either case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for DryFireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safety inputs observed when the decision was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySnapshot {
    pub max_price_age_ms: i64,
    pub time_skew_ms: i64,
    pub estimated_slippage: Decimal,
    pub combined_implied_probability: Decimal,
    pub breaker_open: bool,
}

/// One simulated decision. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryFireTradeLog {
    pub opportunity_id: OpportunityId,
    pub logged_at: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
    pub status: DryFireStatus,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub leg_a: OpportunityLeg,
    pub leg_b: OpportunityLeg,
    pub total_cost: Decimal,
    pub guaranteed_return: Decimal,
    pub expected_profit: Decimal,
    pub profit_margin: Decimal,
    pub match_score: f64,
    pub safety: SafetySnapshot,
}

impl DryFireTradeLog {
    #[must_use]
    pub fn new(
        opportunity: &ArbitrageOpportunity,
        status: DryFireStatus,
        reasons: Vec<String>,
        safety: SafetySnapshot,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            opportunity_id: opportunity.id().clone(),
            logged_at,
            detected_at: opportunity.detected_at(),
            status,
            reasons,
            leg_a: opportunity.leg_a().clone(),
            leg_b: opportunity.leg_b().clone(),
            total_cost: opportunity.total_cost(),
            guaranteed_return: opportunity.guaranteed_return(),
            expected_profit: opportunity.expected_profit(),
            profit_margin: opportunity.profit_margin(),
            match_score: opportunity.match_score(),
            safety,
        }
    }

    #[must_use]
    pub fn involves(&self, venue: &VenueId) -> bool {
        &self.leg_a.venue == venue || &self.leg_b.venue == venue
    }

    /// Capture-time skew between the two legs.
    #[must_use]
    pub fn time_skew_ms(&self) -> i64 {
        (self.leg_a.odds_as_of - self.leg_b.odds_as_of)
            .num_milliseconds()
            .abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            DryFireStatus::parse("rejected_by_risk"),
            Some(DryFireStatus::RejectedByRisk)
        );
        assert_eq!(DryFireStatus::parse("SIMULATED"), Some(DryFireStatus::Simulated));
        assert_eq!(DryFireStatus::parse("executed"), None);
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&DryFireStatus::RejectedBySafety).unwrap();
        assert_eq!(json, "\"REJECTED_BY_SAFETY\"");
    }
}
