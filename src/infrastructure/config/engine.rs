//! Matcher, scanner and execution-gate settings.
//!
//! Every threshold here is a calibration knob rather than a derived
//! constant; the defaults mirror the application types' own defaults.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::application::calculator::CalculatorConfig;
use crate::application::dry_fire::{RiskLimits, SafetyLimits, ValidationLimits};
use crate::application::matcher::{AliasTable, MarketMatcher, MatchWeights, DEFAULT_MATCH_THRESHOLD};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_entity_weight")]
    pub entity: f64,
    #[serde(default = "default_date_weight")]
    pub date: f64,
    #[serde(default = "default_number_weight")]
    pub number: f64,
    #[serde(default = "default_direction_weight")]
    pub direction: f64,
}

fn default_entity_weight() -> f64 {
    0.55
}

fn default_date_weight() -> f64 {
    0.2
}

fn default_number_weight() -> f64 {
    0.15
}

fn default_direction_weight() -> f64 {
    0.1
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            entity: default_entity_weight(),
            date: default_date_weight(),
            number: default_number_weight(),
            direction: default_direction_weight(),
        }
    }
}

/// `[matcher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_entity_floor")]
    pub entity_floor: f64,
    /// Distinct venues an event group needs.
    #[serde(default = "default_min_platforms")]
    pub min_platforms: usize,
    /// Extra aliases added on top of the built-ins, canonical → phrases:
    /// `bitcoin = ["btc", "xbt"]`.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

fn default_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_entity_floor() -> f64 {
    0.5
}

fn default_min_platforms() -> usize {
    2
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            weights: WeightsConfig::default(),
            entity_floor: default_entity_floor(),
            min_platforms: default_min_platforms(),
            aliases: BTreeMap::new(),
        }
    }
}

impl MatcherConfig {
    #[must_use]
    pub fn weights(&self) -> MatchWeights {
        MatchWeights {
            entity: self.weights.entity,
            date: self.weights.date,
            number: self.weights.number,
            direction: self.weights.direction,
            entity_floor: self.entity_floor,
        }
    }

    /// Build a matcher with the built-in aliases plus configured ones.
    #[must_use]
    pub fn matcher(&self) -> MarketMatcher {
        let mut aliases = AliasTable::with_defaults();
        for (canonical, phrases) in &self.aliases {
            for phrase in phrases {
                aliases.add(phrase.split_whitespace(), canonical);
            }
        }
        MarketMatcher::new(aliases, self.weights(), self.threshold)
    }
}

/// `[scanner]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Minimum profit margin in percent.
    #[serde(default = "default_min_profit_margin")]
    pub min_profit_margin: Decimal,
    /// Contracts per side for prediction/prediction pairs.
    #[serde(default = "default_contract_count")]
    pub contract_count: Decimal,
    /// Dollar payout for pairs involving a sportsbook leg.
    #[serde(default = "default_target_payout")]
    pub target_payout: Decimal,
    /// Share of a venue's balance one leg may use.
    #[serde(default = "default_max_bet_pct")]
    pub max_bet_pct: Decimal,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_min_profit_margin() -> Decimal {
    dec!(1.0)
}

fn default_contract_count() -> Decimal {
    dec!(100)
}

fn default_target_payout() -> Decimal {
    dec!(100)
}

fn default_max_bet_pct() -> Decimal {
    dec!(0.1)
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            min_profit_margin: default_min_profit_margin(),
            contract_count: default_contract_count(),
            target_payout: default_target_payout(),
            max_bet_pct: default_max_bet_pct(),
        }
    }
}

impl ScannerConfig {
    #[must_use]
    pub fn calculator(&self) -> CalculatorConfig {
        CalculatorConfig {
            contract_count: self.contract_count,
            target_payout: self.target_payout,
        }
    }
}

/// `[safety]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_max_price_age_ms")]
    pub max_price_age_ms: i64,
    #[serde(default = "default_max_skew_ms")]
    pub max_skew_ms: i64,
    #[serde(default = "default_min_combined_implied")]
    pub min_combined_implied: Decimal,
    #[serde(default = "default_max_combined_implied")]
    pub max_combined_implied: Decimal,
    #[serde(default = "default_max_platform_divergence")]
    pub max_platform_divergence: Decimal,
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
}

fn default_max_price_age_ms() -> i64 {
    5_000
}

fn default_max_skew_ms() -> i64 {
    2_000
}

fn default_min_combined_implied() -> Decimal {
    dec!(0.5)
}

fn default_max_combined_implied() -> Decimal {
    dec!(1.0)
}

fn default_max_platform_divergence() -> Decimal {
    dec!(0.5)
}

fn default_max_slippage() -> Decimal {
    dec!(0.02)
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_price_age_ms: default_max_price_age_ms(),
            max_skew_ms: default_max_skew_ms(),
            min_combined_implied: default_min_combined_implied(),
            max_combined_implied: default_max_combined_implied(),
            max_platform_divergence: default_max_platform_divergence(),
            max_slippage: default_max_slippage(),
        }
    }
}

impl From<&SafetyConfig> for SafetyLimits {
    fn from(config: &SafetyConfig) -> Self {
        Self {
            max_price_age_ms: config.max_price_age_ms,
            max_skew_ms: config.max_skew_ms,
            min_combined_implied: config.min_combined_implied,
            max_combined_implied: config.max_combined_implied,
            max_platform_divergence: config.max_platform_divergence,
            max_slippage: config.max_slippage,
        }
    }
}

/// `[risk]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub min_hours_to_expiry: f64,
    #[serde(default = "default_max_hours_to_expiry")]
    pub max_hours_to_expiry: f64,
    #[serde(default = "default_min_stake")]
    pub min_stake: Decimal,
    #[serde(default = "default_max_stake")]
    pub max_stake: Decimal,
}

fn default_max_hours_to_expiry() -> f64 {
    24.0 * 90.0
}

fn default_min_stake() -> Decimal {
    dec!(1)
}

fn default_max_stake() -> Decimal {
    dec!(1000)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_hours_to_expiry: 0.0,
            max_hours_to_expiry: default_max_hours_to_expiry(),
            min_stake: default_min_stake(),
            max_stake: default_max_stake(),
        }
    }
}

impl From<&RiskConfig> for RiskLimits {
    fn from(config: &RiskConfig) -> Self {
        Self {
            min_hours_to_expiry: config.min_hours_to_expiry,
            max_hours_to_expiry: config.max_hours_to_expiry,
            min_stake: config.min_stake,
            max_stake: config.max_stake,
        }
    }
}

/// `[validation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_match_confidence")]
    pub min_match_confidence: f64,
}

fn default_min_match_confidence() -> f64 {
    0.7
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_match_confidence: default_min_match_confidence(),
        }
    }
}

impl From<&ValidationConfig> for ValidationLimits {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_match_confidence: config.min_match_confidence,
        }
    }
}

/// `[breaker]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// The breaker opens once consecutive failures exceed this.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_failure_threshold() -> u32 {
    5
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
        }
    }
}
