//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the store token is read from
//! `CROSSBOOK_KV_TOKEN` at connection time and never from the file.
//!
//! # Example
//!
//! ```no_run
//! use crossbook::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::engine::{
    BreakerConfig, MatcherConfig, RiskConfig, SafetyConfig, ScannerConfig, ValidationConfig,
};
use super::feed::FeedConfig;
use super::heartbeat::HeartbeatConfig;
use super::logging::LoggingConfig;
use super::store::{JournalConfig, StoreConfig, StoreKind};
use super::venue::VenueConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON market catalog.
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Run every detected opportunity through the dry-fire simulator.
    #[serde(default = "default_dry_fire")]
    pub dry_fire: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub venues: Vec<VenueConfig>,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub breaker: BreakerConfig,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub journal: JournalConfig,
}

fn default_dry_fire() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            dry_fire: default_dry_fire(),
            logging: LoggingConfig::default(),
            venues: Vec::new(),
            feed: FeedConfig::default(),
            matcher: MatcherConfig::default(),
            scanner: ScannerConfig::default(),
            safety: SafetyConfig::default(),
            risk: RiskConfig::default(),
            validation: ValidationConfig::default(),
            breaker: BreakerConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            store: StoreConfig::default(),
            journal: JournalConfig::default(),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or any value is out of range.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Render the effective configuration, defaults included.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| invalid("config", &e.to_string()))
    }

    pub fn enabled_venues(&self) -> impl Iterator<Item = &VenueConfig> {
        self.venues.iter().filter(|v| v.enabled)
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.validate_venues()?;

        let feed = &self.feed;
        if feed.base_delay_ms == 0 {
            return Err(invalid("base_delay_ms", "must be greater than 0"));
        }
        if feed.max_delay_ms < feed.base_delay_ms {
            return Err(invalid("max_delay_ms", "must be >= base_delay_ms"));
        }
        if feed.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be greater than 0"));
        }
        if feed.ping_interval_secs == 0 {
            return Err(invalid("ping_interval_secs", "must be greater than 0"));
        }
        if feed.connect_timeout_ms == 0 {
            return Err(invalid("connect_timeout_ms", "must be greater than 0"));
        }
        if feed.channel_capacity == 0 {
            return Err(invalid("channel_capacity", "must be greater than 0"));
        }

        let matcher = &self.matcher;
        if !(matcher.threshold > 0.0 && matcher.threshold <= 1.0) {
            return Err(invalid("threshold", "must be in (0, 1]"));
        }
        let w = &matcher.weights;
        if [w.entity, w.date, w.number, w.direction].iter().any(|x| *x < 0.0 || !x.is_finite()) {
            return Err(invalid("weights", "weights must be non-negative"));
        }
        if w.entity + w.date + w.number + w.direction <= 0.0 {
            return Err(invalid("weights", "weights must not all be zero"));
        }
        if !(0.0..=1.0).contains(&matcher.entity_floor) {
            return Err(invalid("entity_floor", "must be between 0 and 1"));
        }
        if matcher.min_platforms < 2 {
            return Err(invalid("min_platforms", "must be at least 2"));
        }

        let scanner = &self.scanner;
        if scanner.interval_ms == 0 {
            return Err(invalid("interval_ms", "must be greater than 0"));
        }
        if scanner.min_profit_margin < Decimal::ZERO {
            return Err(invalid("min_profit_margin", "must be 0 or greater"));
        }
        if scanner.contract_count <= Decimal::ZERO {
            return Err(invalid("contract_count", "must be greater than 0"));
        }
        if scanner.target_payout <= Decimal::ZERO {
            return Err(invalid("target_payout", "must be greater than 0"));
        }
        if scanner.max_bet_pct <= Decimal::ZERO || scanner.max_bet_pct > Decimal::ONE {
            return Err(invalid("max_bet_pct", "must be in (0, 1]"));
        }

        let safety = &self.safety;
        if safety.max_price_age_ms <= 0 {
            return Err(invalid("max_price_age_ms", "must be greater than 0"));
        }
        if safety.max_skew_ms < 0 {
            return Err(invalid("max_skew_ms", "must be 0 or greater"));
        }
        if safety.min_combined_implied > safety.max_combined_implied {
            return Err(invalid("min_combined_implied", "must be <= max_combined_implied"));
        }
        if safety.max_platform_divergence < Decimal::ZERO {
            return Err(invalid("max_platform_divergence", "must be 0 or greater"));
        }
        if safety.max_slippage < Decimal::ZERO || safety.max_slippage > Decimal::ONE {
            return Err(invalid("max_slippage", "must be between 0 and 1"));
        }

        let risk = &self.risk;
        if risk.min_hours_to_expiry > risk.max_hours_to_expiry {
            return Err(invalid("min_hours_to_expiry", "must be <= max_hours_to_expiry"));
        }
        if risk.min_stake <= Decimal::ZERO {
            return Err(invalid("min_stake", "must be greater than 0"));
        }
        if risk.max_stake < risk.min_stake {
            return Err(invalid("max_stake", "must be >= min_stake"));
        }

        if !(0.0..=1.0).contains(&self.validation.min_match_confidence) {
            return Err(invalid("min_match_confidence", "must be between 0 and 1"));
        }

        let heartbeat = &self.heartbeat;
        if heartbeat.interval_secs == 0 {
            return Err(invalid("interval_secs", "must be greater than 0"));
        }
        if heartbeat.stale_ms <= 0 {
            return Err(invalid("stale_ms", "must be greater than 0"));
        }
        if heartbeat.venue_stale_ms <= 0 {
            return Err(invalid("venue_stale_ms", "must be greater than 0"));
        }
        if heartbeat.key.trim().is_empty() {
            return Err(invalid("key", "must not be empty"));
        }

        if self.store.kind == StoreKind::Http
            && self.store.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::MissingField { field: "store.url" }.into());
        }
        if self.store.flags_key == heartbeat.key {
            return Err(invalid("flags_key", "must differ from the heartbeat key"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_venues(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if venue.id.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "venues.id" }.into());
            }
            if !seen.insert(venue.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "venues.id",
                    reason: format!("duplicate venue '{}'", venue.id),
                }
                .into());
            }
            let url = url::Url::parse(&venue.ws_url).map_err(|e| ConfigError::InvalidValue {
                field: "ws_url",
                reason: format!("{}: {e}", venue.id),
            })?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(ConfigError::InvalidValue {
                    field: "ws_url",
                    reason: format!("{}: scheme must be ws or wss", venue.id),
                }
                .into());
            }
            if venue.balance.is_some_and(|b| b < Decimal::ZERO) {
                return Err(ConfigError::InvalidValue {
                    field: "balance",
                    reason: format!("{}: must be 0 or greater", venue.id),
                }
                .into());
            }
        }
        Ok(())
    }
}
