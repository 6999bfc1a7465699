//! Handlers for the `dry-fire` command group.
//!
//! Everything here is read from the journal; nothing is recomputed from
//! live state.

use std::fs;

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{DryFireExportArgs, DryFireFilterArgs, DryFireListArgs};
use crate::adapter::inbound::cli::output;
use crate::application::dry_fire::{export_csv, DryFireQuery, DryFireStats};
use crate::application::journal::DryFireJournal;
use crate::domain::{DryFireStatus, DryFireTradeLog};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::factory::store::build_stores;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Logged")]
    logged_at: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Legs")]
    legs: String,
    #[tabled(rename = "Margin")]
    margin: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Reasons")]
    reasons: String,
}

impl From<&DryFireTradeLog> for LogRow {
    fn from(log: &DryFireTradeLog) -> Self {
        Self {
            logged_at: log.logged_at.format("%m-%d %H:%M:%S").to_string(),
            status: log.status.to_string(),
            legs: format!(
                "{} {} / {} {}",
                log.leg_a.venue, log.leg_a.side, log.leg_b.venue, log.leg_b.side
            ),
            margin: format!("{}%", log.profit_margin.round_dp(2)),
            profit: format!("${}", log.expected_profit.round_dp(2)),
            reasons: if log.reasons.is_empty() {
                "-".to_string()
            } else {
                log.reasons.join("; ")
            },
        }
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Count")]
    count: usize,
}

fn query(filter: &DryFireFilterArgs) -> DryFireQuery {
    DryFireQuery {
        since: filter.since,
        venue: filter.venue.as_deref().map(Into::into),
        status: filter.status,
        limit: None,
    }
}

async fn load(filter: &DryFireFilterArgs, query: &DryFireQuery) -> Result<Vec<DryFireTradeLog>> {
    let config = Config::load(&filter.config.config)?;
    let stores = build_stores(&config)?;
    let logs = DryFireJournal::new(stores.logs).read_since(filter.since).await?;
    Ok(query.apply(logs))
}

/// Execute `dry-fire list`.
pub async fn list(args: &DryFireListArgs) -> Result<()> {
    let query = query(&args.filter).limit(args.limit);
    let logs = load(&args.filter, &query).await?;

    if output::is_json() {
        output::command_json("dry-fire.list", json!({ "records": logs }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    if logs.is_empty() {
        output::note("no dry-fire records match");
        return Ok(());
    }
    output::table(logs.iter().map(LogRow::from));
    output::field("Shown", logs.len());
    Ok(())
}

/// Execute `dry-fire stats`.
pub async fn stats(args: &DryFireFilterArgs) -> Result<()> {
    let logs = load(args, &query(args)).await?;
    let stats = DryFireStats::replay(&logs);

    if output::is_json() {
        output::command_json("dry-fire.stats", serde_json::to_value(&stats)?);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Records", stats.total);
    output::field(
        "Simulated",
        output::positive(format!("${}", stats.simulated_profit.round_dp(2))),
    );
    if let Some(margin) = stats.average_margin {
        output::field("Avg margin", format!("{}%", margin.round_dp(2)));
    }

    output::section("By status");
    output::table(DryFireStatus::ALL.into_iter().map(|status| CountRow {
        key: status.to_string(),
        count: stats.count(status),
    }));

    if !stats.by_venue.is_empty() {
        output::section("By venue");
        output::table(stats.by_venue.iter().map(|(venue, count)| CountRow {
            key: venue.to_string(),
            count: *count,
        }));
    }

    output::section("By margin");
    output::table(stats.profit_buckets.iter().map(|bucket| CountRow {
        key: bucket.label.clone(),
        count: bucket.count,
    }));
    Ok(())
}

/// Execute `dry-fire export`.
pub async fn export(args: &DryFireExportArgs) -> Result<()> {
    let logs = load(&args.filter, &query(&args.filter)).await?;
    let csv = export_csv(&logs);

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, csv)?;
            if output::is_json() {
                output::command_json(
                    "dry-fire.export",
                    json!({ "path": path.display().to_string(), "records": logs.len() }),
                );
            } else {
                output::success(&format!("Exported {} records to {}", logs.len(), path.display()));
            }
        }
        None => print!("{csv}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::inbound::cli::command::ConfigPathArg;
    use std::path::PathBuf;

    #[test]
    fn filter_args_become_a_query() {
        let args = DryFireFilterArgs {
            config: ConfigPathArg {
                config: PathBuf::from("crossbook.toml"),
            },
            since: None,
            venue: Some("kalshi".to_string()),
            status: Some(DryFireStatus::RejectedByRisk),
        };
        let query = query(&args);
        assert_eq!(query.venue.as_ref().map(|v| v.as_str()), Some("kalshi"));
        assert_eq!(query.status, Some(DryFireStatus::RejectedByRisk));
        assert_eq!(query.limit, None);
    }
}
