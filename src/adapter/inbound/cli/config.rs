//! Handlers for the `config` command group.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::store::KV_TOKEN_ENV;
use crate::error::Result;
use crate::infrastructure::config::store::StoreKind;
use crate::infrastructure::config::Config;

/// Execute `config show`: the effective configuration as TOML, defaults
/// included.
pub fn show(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    if output::is_json() {
        output::command_json("config.show", json!({ "config": serde_json::to_value(&config)? }));
        return Ok(());
    }

    print!("{}", config.to_toml()?);
    Ok(())
}

/// Execute `config validate`.
pub fn validate(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let warnings = warnings(&config);

    if output::is_json() {
        output::command_json(
            "config.validate",
            json!({
                "path": path.display().to_string(),
                "valid": true,
                "warnings": warnings,
            }),
        );
        return Ok(());
    }

    output::section("Config Validation");
    output::field("Path", path.display());
    output::success("Config file is valid");
    if !warnings.is_empty() {
        output::section("Warnings");
        for warning in &warnings {
            output::warning(warning);
        }
    }
    output::field("Next", format!("crossbook config show -c {}", path.display()));
    Ok(())
}

/// Valid but probably unintended settings.
fn warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    let enabled = config.enabled_venues().count();
    if enabled < 2 {
        warnings.push(format!(
            "{enabled} enabled venue(s); cross-venue detection needs at least 2"
        ));
    }
    if config.catalog.is_none() {
        warnings.push("no catalog configured; pass --catalog to `crossbook run`".to_string());
    }
    match config.store.kind {
        StoreKind::Memory => {
            warnings.push("memory store is invisible to `crossbook status`".to_string());
        }
        StoreKind::Http if std::env::var(KV_TOKEN_ENV).map_or(true, |t| t.trim().is_empty()) => {
            warnings.push(format!("{KV_TOKEN_ENV} is not set"));
        }
        StoreKind::File | StoreKind::Http => {}
    }
    warnings
}
