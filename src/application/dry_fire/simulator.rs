//! Dry-fire decision pipeline.
//!
//! Stages run in order and the first failing stage decides the status:
//! safety (price age, skew, implied probability, platform divergence,
//! slippage, breaker) → risk (expiry window, stake bounds) → validation
//! (match confidence). Every failed check of that stage is recorded as a
//! reason. Nothing is ever executed.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::domain::{
    ArbitrageOpportunity, CircuitBreakerState, DryFireStatus, DryFireTradeLog, MarketKind,
    OpportunityLeg, SafetySnapshot,
};

/// Freshness and sanity bounds checked first.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyLimits {
    /// Oldest acceptable leg quote at decision time.
    pub max_price_age_ms: i64,
    /// Largest acceptable capture-time gap between legs.
    pub max_skew_ms: i64,
    pub min_combined_implied: Decimal,
    pub max_combined_implied: Decimal,
    /// Upper bound on `|implied_a − (1 − implied_b)|`.
    pub max_platform_divergence: Decimal,
    /// Estimated half-spread cost as a fraction of total cost.
    pub max_slippage: Decimal,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_price_age_ms: 5_000,
            max_skew_ms: 2_000,
            min_combined_implied: dec!(0.5),
            max_combined_implied: dec!(1.0),
            max_platform_divergence: dec!(0.5),
            max_slippage: dec!(0.02),
        }
    }
}

/// Exposure bounds checked after safety.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub min_hours_to_expiry: f64,
    pub max_hours_to_expiry: f64,
    /// Per-leg stake bounds in dollars.
    pub min_stake: Decimal,
    pub max_stake: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            min_hours_to_expiry: 0.0,
            max_hours_to_expiry: 24.0 * 90.0,
            min_stake: dec!(1),
            max_stake: dec!(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationLimits {
    pub min_match_confidence: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_match_confidence: 0.7,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DryFireSimulator {
    safety: SafetyLimits,
    risk: RiskLimits,
    validation: ValidationLimits,
}

impl DryFireSimulator {
    #[must_use]
    pub const fn new(safety: SafetyLimits, risk: RiskLimits, validation: ValidationLimits) -> Self {
        Self {
            safety,
            risk,
            validation,
        }
    }

    #[must_use]
    pub const fn safety(&self) -> &SafetyLimits {
        &self.safety
    }

    /// Decide what would have happened to `opportunity` at `now`.
    #[must_use]
    pub fn simulate(
        &self,
        opportunity: &ArbitrageOpportunity,
        breaker: &CircuitBreakerState,
        now: DateTime<Utc>,
    ) -> DryFireTradeLog {
        let snapshot = snapshot(opportunity, breaker, now);

        let (status, reasons) = [
            (DryFireStatus::RejectedBySafety, self.safety_reasons(opportunity, &snapshot, breaker)),
            (DryFireStatus::RejectedByRisk, self.risk_reasons(opportunity, now)),
            (DryFireStatus::RejectedByValidation, self.validation_reasons(opportunity)),
        ]
        .into_iter()
        .find(|(_, reasons)| !reasons.is_empty())
        .unwrap_or((DryFireStatus::Simulated, Vec::new()));

        if status == DryFireStatus::Simulated {
            info!(
                id = %opportunity.id(),
                profit = %opportunity.expected_profit().round_dp(2),
                margin = %opportunity.profit_margin().round_dp(2),
                "Dry-fire would execute"
            );
        } else {
            warn!(
                id = %opportunity.id(),
                status = %status,
                reasons = %reasons.join("; "),
                "Dry-fire rejected opportunity"
            );
        }

        DryFireTradeLog::new(opportunity, status, reasons, snapshot, now)
    }

    fn safety_reasons(
        &self,
        opportunity: &ArbitrageOpportunity,
        snapshot: &SafetySnapshot,
        breaker: &CircuitBreakerState,
    ) -> Vec<String> {
        let limits = &self.safety;
        let mut reasons = Vec::new();

        if breaker.is_open {
            let why = breaker.open_reason.as_deref().unwrap_or("unknown");
            reasons.push(format!("circuit breaker open: {why}"));
        }
        if snapshot.max_price_age_ms > limits.max_price_age_ms {
            reasons.push(format!(
                "price age {}ms exceeds {}ms",
                snapshot.max_price_age_ms, limits.max_price_age_ms
            ));
        }
        if snapshot.time_skew_ms > limits.max_skew_ms {
            reasons.push(format!(
                "time skew {}ms exceeds {}ms",
                snapshot.time_skew_ms, limits.max_skew_ms
            ));
        }
        let combined = snapshot.combined_implied_probability;
        if combined < limits.min_combined_implied || combined > limits.max_combined_implied {
            reasons.push(format!(
                "combined implied probability {} outside [{}, {}]",
                combined.round_dp(4),
                limits.min_combined_implied,
                limits.max_combined_implied
            ));
        }
        let divergence = platform_divergence(opportunity);
        if divergence > limits.max_platform_divergence {
            reasons.push(format!(
                "platform divergence {} exceeds {}",
                divergence.round_dp(4),
                limits.max_platform_divergence
            ));
        }
        if snapshot.estimated_slippage > limits.max_slippage {
            reasons.push(format!(
                "estimated slippage {} exceeds {}",
                snapshot.estimated_slippage.round_dp(4),
                limits.max_slippage
            ));
        }
        reasons
    }

    fn risk_reasons(&self, opportunity: &ArbitrageOpportunity, now: DateTime<Utc>) -> Vec<String> {
        let limits = &self.risk;
        let mut reasons = Vec::new();

        for leg in opportunity.legs() {
            if let Some(expiry) = leg.expires_at {
                let hours = (expiry - now).num_seconds() as f64 / 3600.0;
                if hours < limits.min_hours_to_expiry || hours > limits.max_hours_to_expiry {
                    reasons.push(format!(
                        "{} expires in {hours:.1}h, outside [{}, {}]h",
                        leg.venue, limits.min_hours_to_expiry, limits.max_hours_to_expiry
                    ));
                }
            }
            if leg.stake < limits.min_stake || leg.stake > limits.max_stake {
                reasons.push(format!(
                    "{} stake {} outside [{}, {}]",
                    leg.venue,
                    leg.stake.round_dp(2),
                    limits.min_stake,
                    limits.max_stake
                ));
            }
        }
        reasons
    }

    fn validation_reasons(&self, opportunity: &ArbitrageOpportunity) -> Vec<String> {
        let min = self.validation.min_match_confidence;
        if opportunity.match_score() < min {
            vec![format!(
                "match confidence {:.3} below {min}",
                opportunity.match_score()
            )]
        } else {
            Vec::new()
        }
    }
}

fn snapshot(
    opportunity: &ArbitrageOpportunity,
    breaker: &CircuitBreakerState,
    now: DateTime<Utc>,
) -> SafetySnapshot {
    let max_price_age_ms = opportunity
        .legs()
        .iter()
        .map(|leg| (now - leg.odds_as_of).num_milliseconds())
        .max()
        .unwrap_or_default();

    SafetySnapshot {
        max_price_age_ms,
        time_skew_ms: opportunity.time_skew_ms(),
        estimated_slippage: estimated_slippage(opportunity),
        combined_implied_probability: opportunity.combined_implied_probability(),
        breaker_open: breaker.is_open,
    }
}

/// Half the quoted spread on every prediction contract, relative to cost.
fn estimated_slippage(opportunity: &ArbitrageOpportunity) -> Decimal {
    let cost = opportunity.total_cost();
    if cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let slip: Decimal = opportunity.legs().iter().map(|leg| leg_slippage(leg)).sum();
    slip / cost
}

fn leg_slippage(leg: &OpportunityLeg) -> Decimal {
    match (leg.kind, leg.spread) {
        (MarketKind::Prediction, Some(spread)) => {
            spread / Decimal::TWO / Decimal::ONE_HUNDRED * leg.quantity
        }
        _ => Decimal::ZERO,
    }
}

fn platform_divergence(opportunity: &ArbitrageOpportunity) -> Decimal {
    let a = opportunity.leg_a().implied_probability;
    let b = opportunity.leg_b().implied_probability;
    (a - (Decimal::ONE - b)).abs()
}
