//! One scan pass over the live cache.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::cache::overlay_all;
use crate::application::dry_fire::DryFireSimulator;
use crate::application::journal::{DryFireJournal, OpportunityJournal};
use crate::application::matcher::MarketMatcher;
use crate::application::registry::EventRegistry;
use crate::application::scanner::OpportunityScanner;
use crate::application::state::StateHandle;
use crate::domain::{ArbitrageOpportunity, DryFireStatus, DryFireTradeLog, Market, OpportunityLeg};
use crate::error::Result;
use crate::infrastructure::flags::RuntimeFlags;

/// What one pass saw and produced.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Set when the matcher flag is off and nothing was scanned.
    pub skipped: bool,
    /// Catalog markets that had live prices.
    pub priced_markets: usize,
    pub groups: usize,
    /// Opportunities first seen in this pass.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Opportunities whose quotes were already reported last pass.
    pub repeated: usize,
    pub trade_logs: Vec<DryFireTradeLog>,
}

impl CycleReport {
    #[must_use]
    pub fn simulated(&self) -> usize {
        self.trade_logs
            .iter()
            .filter(|log| log.status == DryFireStatus::Simulated)
            .count()
    }
}

/// Cache snapshot → event groups → opportunities → dry-fire decisions.
///
/// An opportunity is reported once per distinct pair of quotes; it is
/// reported again only after one of its legs is re-quoted.
pub struct ScanCycle {
    state: StateHandle,
    catalog: Vec<Market>,
    matcher: MarketMatcher,
    registry: EventRegistry,
    scanner: OpportunityScanner,
    simulator: DryFireSimulator,
    opportunities: OpportunityJournal,
    dry_fires: DryFireJournal,
    dry_fire: bool,
    min_profit_margin: Decimal,
    seen: HashSet<String>,
}

impl ScanCycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: StateHandle,
        catalog: Vec<Market>,
        matcher: MarketMatcher,
        registry: EventRegistry,
        scanner: OpportunityScanner,
        simulator: DryFireSimulator,
        opportunities: OpportunityJournal,
        dry_fires: DryFireJournal,
    ) -> Self {
        Self {
            state,
            catalog,
            matcher,
            registry,
            scanner,
            simulator,
            opportunities,
            dry_fires,
            dry_fire: true,
            min_profit_margin: Decimal::ONE,
            seen: HashSet::new(),
        }
    }

    /// Static dry-fire switch; the runtime flag can only narrow it.
    #[must_use]
    pub fn with_dry_fire(mut self, enabled: bool) -> Self {
        self.dry_fire = enabled;
        self
    }

    #[must_use]
    pub fn with_min_profit_margin(mut self, margin: Decimal) -> Self {
        self.min_profit_margin = margin;
        self
    }

    /// Run one pass.
    ///
    /// Journal failures are logged and do not fail the pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`](crate::error::Error::ChannelClosed)
    /// when the state task is gone.
    pub async fn run_once(&mut self, flags: &RuntimeFlags, now: DateTime<Utc>) -> Result<CycleReport> {
        if !flags.matcher_enabled {
            debug!("Matcher disabled by runtime flag, skipping scan");
            self.seen.clear();
            return Ok(CycleReport {
                skipped: true,
                ..CycleReport::default()
            });
        }

        let prices = self.state.all_prices().await?;
        let markets = overlay_all(&self.catalog, &prices);
        let registry = self.registry.clone().sports_only(flags.sports_only);
        let groups = registry.build(&self.matcher, &markets, now);
        let margin = flags.min_profit_margin_or(self.min_profit_margin);

        let mut report = CycleReport {
            priced_markets: markets.len(),
            groups: groups.len(),
            ..CycleReport::default()
        };

        let mut seen = HashSet::new();
        for group in &groups {
            for opportunity in self.scanner.scan_group(&self.matcher, group, margin, now) {
                let signature = quote_signature(&opportunity);
                let fresh = !self.seen.contains(&signature);
                if !seen.insert(signature) {
                    continue;
                }
                if fresh {
                    report.opportunities.push(opportunity);
                } else {
                    report.repeated += 1;
                }
            }
        }
        self.seen = seen;

        for opportunity in &report.opportunities {
            if let Err(e) = self.opportunities.append(opportunity).await {
                warn!(id = %opportunity.id(), error = %e, "Failed to journal opportunity");
            }
        }

        if self.dry_fire && flags.dry_fire_enabled && !report.opportunities.is_empty() {
            let breaker = self.state.breaker().await?;
            for opportunity in &report.opportunities {
                let log = self.simulator.simulate(opportunity, &breaker, now);
                if let Err(e) = self.dry_fires.append(&log).await {
                    warn!(id = %log.opportunity_id, error = %e, "Failed to journal dry-fire log");
                }
                report.trade_logs.push(log);
            }
        }

        if !report.opportunities.is_empty() {
            info!(
                groups = report.groups,
                opportunities = report.opportunities.len(),
                simulated = report.simulated(),
                "Scan found opportunities"
            );
        }
        Ok(report)
    }
}

fn quote_signature(opportunity: &ArbitrageOpportunity) -> String {
    let leg = |leg: &OpportunityLeg| {
        format!(
            "{}/{}/{}@{}",
            leg.venue,
            leg.market_id,
            leg.side,
            leg.odds_as_of.timestamp_millis()
        )
    };
    format!("{}|{}", leg(opportunity.leg_a()), leg(opportunity.leg_b()))
}
