//! Detection engine construction.

use crate::application::calculator::ArbitrageCalculator;
use crate::application::dry_fire::DryFireSimulator;
use crate::application::registry::EventRegistry;
use crate::application::scanner::{OpportunityScanner, VenueProfile};
use crate::infrastructure::config::venue::VenueConfig;
use crate::infrastructure::config::Config;

/// Scanner with one fee/bet-cap profile per enabled venue.
#[must_use]
pub fn build_scanner(config: &Config) -> OpportunityScanner {
    let calculator = ArbitrageCalculator::new(config.scanner.calculator());
    config
        .enabled_venues()
        .fold(OpportunityScanner::new(calculator), |scanner, venue| {
            let profile = venue_profile(config, venue);
            scanner.with_venue(venue.id.as_str(), profile)
        })
}

/// `max_bet = balance × max_bet_pct`; unbounded without a balance.
#[must_use]
pub fn venue_profile(config: &Config, venue: &VenueConfig) -> VenueProfile {
    VenueProfile {
        fee: venue.fee,
        max_bet: venue.balance.map(|balance| balance * config.scanner.max_bet_pct),
    }
}

#[must_use]
pub fn build_simulator(config: &Config) -> DryFireSimulator {
    DryFireSimulator::new(
        (&config.safety).into(),
        (&config.risk).into(),
        (&config.validation).into(),
    )
}

#[must_use]
pub fn build_registry(config: &Config) -> EventRegistry {
    EventRegistry::new(config.matcher.min_platforms)
}
