//! Handler for the `status` command.

use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use crate::adapter::inbound::cli::command::StatusArgs;
use crate::adapter::inbound::cli::output;
use crate::application::heartbeat::{HeartbeatReader, VenueView, WorkerStatus};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::factory::store::build_stores;

#[derive(Tabled)]
struct VenueRow {
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last message")]
    age: String,
    #[tabled(rename = "Messages")]
    messages: u64,
    #[tabled(rename = "Parse errors")]
    parse_errors: u64,
    #[tabled(rename = "Reconnects")]
    reconnects: u32,
}

impl From<&VenueView> for VenueRow {
    fn from(view: &VenueView) -> Self {
        let age = match view.message_age_ms {
            Some(ms) if view.stale => format!("{} (stale)", format_age(ms)),
            Some(ms) => format_age(ms),
            None => "never".to_string(),
        };
        Self {
            venue: view.venue.to_string(),
            kind: view.kind.to_string(),
            state: view.state.to_string(),
            age,
            messages: view.messages_received,
            parse_errors: view.parse_errors,
            reconnects: view.reconnect_attempts,
        }
    }
}

/// Execute the status command.
///
/// With `--ready` the exit code reflects readiness.
pub async fn execute(args: &StatusArgs) -> Result<ExitCode> {
    let config = Config::load(&args.config.config)?;
    let store = match build_stores(&config) {
        Ok(stores) => Some(stores.kv),
        Err(e) => {
            output::warning(&e.to_string());
            None
        }
    };

    let reader = HeartbeatReader::new(store, config.heartbeat.key.clone())
        .with_stale_ms(config.heartbeat.stale_ms)
        .with_venue_stale_ms(config.heartbeat.venue_stale_ms)
        .with_read_timeout(Duration::from_millis(config.heartbeat.read_timeout_ms));
    let status = reader.read().await;

    if output::is_json() {
        output::command_json("status", serde_json::to_value(&status)?);
    } else if !output::is_quiet() {
        display(&status);
    }

    Ok(if args.ready && !status.ready {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn display(status: &WorkerStatus) {
    output::header(env!("CARGO_PKG_VERSION"));
    let verdict = if status.ready {
        output::positive("ready")
    } else {
        output::negative("not ready")
    };
    output::field("Status", format!("{} ({verdict})", status.status));
    if let Some(reason) = &status.reason {
        output::field("Reason", reason);
    }
    if let Some(state) = status.state {
        output::field("Worker", state);
    }
    if let Some(age) = status.heartbeat_age_ms {
        output::field("Heartbeat", format!("{} ago", format_age(age)));
    }
    if let Some(tick) = status.tick {
        output::field("Tick", tick);
    }
    if let Some(started_at) = status.started_at {
        output::field("Started", format_time(started_at));
    }

    if let Some(breaker) = &status.circuit_breaker {
        output::section("Circuit breaker");
        if breaker.is_open {
            output::field("State", output::negative("open"));
            if let Some(reason) = &breaker.open_reason {
                output::field("Reason", reason);
            }
        } else {
            output::field("State", output::positive("closed"));
        }
        output::field("Failures", breaker.consecutive_failures);
    }

    if let Some(cache) = &status.cache {
        output::section("Price cache");
        output::field("Entries", cache.total_entries);
        output::field("Updates", cache.total_updates);
    }

    if !status.venues.is_empty() {
        output::section("Venues");
        output::table(status.venues.iter().map(VenueRow::from));
    }

    if let Some(shutdown) = &status.shutdown {
        output::section("Shutdown");
        output::field("Reason", &shutdown.reason);
        output::field("Requested", format_time(shutdown.requested_at));
    }

    if !status.worker_present {
        output::hint("start the worker with `crossbook run`");
    }
}

fn format_age(ms: i64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m{}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
