//! Command-line interface definitions.
//!
//! Defines the CLI structure for crossbook using `clap`: the detection
//! worker itself plus read-only tools over its heartbeat, dry-fire journal,
//! matcher and configuration.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::DryFireStatus;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "crossbook.toml";

/// Live cross-venue arbitrage detection
#[derive(Parser, Debug)]
#[command(name = "crossbook")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the detection worker until interrupted
    Run(RunArgs),

    /// Show worker health from the latest heartbeat
    Status(StatusArgs),

    /// Inspect the dry-fire journal
    #[command(subcommand)]
    DryFire(DryFireCommand),

    /// Score two market titles with the matcher
    #[command(subcommand)]
    Match(MatchCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `crossbook dry-fire`.
#[derive(Subcommand, Debug)]
pub enum DryFireCommand {
    /// List dry-fire decisions, oldest first
    List(DryFireListArgs),
    /// Aggregate counts and profit buckets
    Stats(DryFireFilterArgs),
    /// Write decisions as CSV
    Export(DryFireExportArgs),
}

/// Subcommands for `crossbook match`.
#[derive(Subcommand, Debug)]
pub enum MatchCommand {
    /// Print the composite similarity and whether it matches
    Score(MatchArgs),
    /// Print the per-term breakdown
    Explain(MatchArgs),
}

/// Subcommands for `crossbook config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness
    Validate(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Args, Debug, Clone)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
///
/// Optional fields override the configuration file.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Market catalog (JSON); overrides `catalog` in the config.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,

    /// Detect and journal opportunities without dry-fire simulation.
    #[arg(long)]
    pub no_dry_fire: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Exit non-zero unless the worker is ready.
    #[arg(long)]
    pub ready: bool,
}

/// Filters shared by the dry-fire subcommands.
#[derive(Args, Debug, Clone)]
pub struct DryFireFilterArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Only records logged at or after this RFC 3339 time.
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Only records with a leg on this venue.
    #[arg(long)]
    pub venue: Option<String>,

    /// Only records with this status (e.g. SIMULATED, REJECTED_BY_SAFETY).
    #[arg(long, value_parser = parse_status)]
    pub status: Option<DryFireStatus>,
}

#[derive(Args, Debug)]
pub struct DryFireListArgs {
    #[command(flatten)]
    pub filter: DryFireFilterArgs,

    /// Maximum records to show.
    #[arg(long, default_value = "50")]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct DryFireExportArgs {
    #[command(flatten)]
    pub filter: DryFireFilterArgs,

    /// Output file path (writes to stdout if not specified).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// First market title.
    pub title_a: String,

    /// Second market title.
    pub title_b: String,

    /// Use matcher settings and aliases from this config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_status(value: &str) -> Result<DryFireStatus, String> {
    DryFireStatus::parse(value).ok_or_else(|| {
        let names: Vec<&str> = DryFireStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!("expected one of {}", names.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dry_fire_filters() {
        let cli = Cli::try_parse_from([
            "crossbook",
            "dry-fire",
            "list",
            "--status",
            "simulated",
            "--venue",
            "kalshi",
            "--since",
            "2025-01-01T00:00:00Z",
        ])
        .unwrap();
        let Commands::DryFire(DryFireCommand::List(args)) = cli.command else {
            panic!("expected dry-fire list");
        };
        assert_eq!(args.filter.status, Some(DryFireStatus::Simulated));
        assert_eq!(args.filter.venue.as_deref(), Some("kalshi"));
        assert!(args.filter.since.is_some());
        assert_eq!(args.limit, 50);
        assert_eq!(args.filter.config.config, PathBuf::from(DEFAULT_CONFIG));
    }

    #[test]
    fn rejects_unknown_status() {
        let result = Cli::try_parse_from(["crossbook", "dry-fire", "stats", "--status", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["crossbook", "match", "score", "a", "b", "--json"]).unwrap();
        assert!(cli.json);
    }
}
