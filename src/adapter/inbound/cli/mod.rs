//! Command-line adapter.
//!
//! Parses nothing itself; [`execute`] takes a parsed [`command::Cli`],
//! applies the global output flags and dispatches to one handler module per
//! command group.

pub mod command;
pub mod config;
pub mod dry_fire;
pub mod matcher;
pub mod output;
pub mod run;
pub mod status;

use std::process::ExitCode;

use command::{Cli, ColorChoice, Commands, ConfigCommand, DryFireCommand, MatchCommand};
use output::OutputConfig;

use crate::error::Result;

/// Apply global flags and run the selected command.
///
/// # Errors
///
/// Returns whatever the handler fails with; the caller reports it.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    apply_color(&cli.color);
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await.map(|()| ExitCode::SUCCESS),
        Commands::Status(args) => status::execute(&args).await,
        Commands::DryFire(command) => {
            match command {
                DryFireCommand::List(args) => dry_fire::list(&args).await,
                DryFireCommand::Stats(args) => dry_fire::stats(&args).await,
                DryFireCommand::Export(args) => dry_fire::export(&args).await,
            }
            .map(|()| ExitCode::SUCCESS)
        }
        Commands::Match(command) => {
            match command {
                MatchCommand::Score(args) => matcher::score(&args),
                MatchCommand::Explain(args) => matcher::explain(&args),
            }
            .map(|()| ExitCode::SUCCESS)
        }
        Commands::Config(command) => {
            match command {
                ConfigCommand::Show(args) => config::show(&args.config),
                ConfigCommand::Validate(args) => config::validate(&args.config),
            }
            .map(|()| ExitCode::SUCCESS)
        }
    }
}

fn apply_color(choice: &ColorChoice) {
    match choice {
        ColorChoice::Auto => owo_colors::unset_override(),
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
}
