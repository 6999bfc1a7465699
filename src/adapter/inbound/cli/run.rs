//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::catalog::Catalog;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::store::StoreKind;
use crate::infrastructure::config::Config;
use crate::infrastructure::factory::store::build_stores;
use crate::infrastructure::worker::Worker;

/// Execute the run command. Returns after ctrl-c once the worker has shut
/// down cleanly.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config.config)?;
    apply_overrides(&mut config, args, output::is_json());
    config.init_logging();

    let catalog = match &config.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };
    let stores = build_stores(&config)?;

    if !output::is_quiet() && !output::is_json() {
        print_startup(&config, &catalog);
    }

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = stop.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for ctrl-c");
                // Keep the sender alive so the worker is not stopped.
                std::future::pending::<()>().await;
            }
        }
    });

    let summary = Worker::new(config, catalog, stores).run(shutdown).await?;

    if output::is_json() {
        output::command_json(
            "run",
            serde_json::json!({
                "cycles": summary.cycles,
                "opportunities": summary.opportunities,
                "simulated": summary.simulated,
            }),
        );
    } else {
        output::section("Stopped");
        output::field("Cycles", summary.cycles);
        output::field("Found", summary.opportunities);
        output::field("Simulated", summary.simulated);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &RunArgs, json_output: bool) {
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || json_output {
        config.logging.format = LogFormat::Json;
    }
    if args.no_dry_fire {
        config.dry_fire = false;
    }
    if let Some(catalog) = &args.catalog {
        config.catalog = Some(catalog.clone());
    }
}

fn print_startup(config: &Config, catalog: &Catalog) {
    output::header(env!("CARGO_PKG_VERSION"));
    let venues: Vec<&str> = config.enabled_venues().map(|v| v.id.as_str()).collect();
    output::field(
        "Venues",
        if venues.is_empty() {
            "none".to_string()
        } else {
            venues.join(", ")
        },
    );
    output::field("Markets", catalog.len());
    output::field("Store", format!("{:?}", config.store.kind).to_lowercase());
    output::field("Dry-fire", if config.dry_fire { "on" } else { "off" });
    output::field("Min margin", format!("{}%", config.scanner.min_profit_margin));
    if config.store.kind == StoreKind::Memory {
        output::warning("memory store: `crossbook status` cannot see this worker");
    }
    if catalog.is_empty() {
        output::hint("set `catalog` in the config or pass --catalog");
    }
    println!();
}
