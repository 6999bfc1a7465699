//! Binary-level checks of the read-only commands.

mod support;

use std::sync::Arc;

use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use rust_decimal_macros::dec;

use crossbook::adapter::outbound::store::FileLogStore;
use crossbook::application::dry_fire::{DryFireSimulator, RiskLimits, SafetyLimits, ValidationLimits};
use crossbook::application::journal::DryFireJournal;
use crossbook::domain::CircuitBreakerState;
use crossbook::testkit::domain::{opportunity, prediction};
use support::workspace::Workspace;

const TITLE: &str = "Will the Chiefs win Super Bowl LX?";

fn crossbook() -> Command {
    let mut cmd = Command::cargo_bin("crossbook").unwrap();
    cmd.env_remove("CROSSBOOK_KV_TOKEN");
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

/// One simulated and one risk-rejected record in the workspace journal.
async fn seed_journal(workspace: &Workspace) {
    let now = Utc::now();
    let sim = DryFireSimulator::new(
        SafetyLimits::default(),
        RiskLimits {
            max_stake: dec!(50),
            ..RiskLimits::default()
        },
        ValidationLimits::default(),
    );
    let a = prediction("polymarket", "pm-kc", TITLE, dec!(40), dec!(60), now);
    let b = prediction("kalshi", "KXSB-KC", TITLE, dec!(58), dec!(42), now);
    let big_b = prediction("kalshi", "KXSB-KC", TITLE, dec!(45), dec!(55), now);
    let closed = CircuitBreakerState::default();

    let journal = DryFireJournal::new(Arc::new(FileLogStore::new(workspace.journal_dir())));
    journal
        .append(&sim.simulate(&opportunity(&a, &b, 0.95, now), &closed, now))
        .await
        .unwrap();
    journal
        .append(&sim.simulate(&opportunity(&a, &big_b, 0.95, now), &closed, now))
        .await
        .unwrap();
}

#[test]
fn config_validate_accepts_the_workspace_config() {
    let workspace = Workspace::new();
    let value = json_stdout(
        crossbook()
            .args(["config", "validate", "--json", "-c"])
            .arg(workspace.config_path()),
    );
    assert_eq!(value["command"], "config.validate");
    assert_eq!(value["valid"], true);
}

#[test]
fn config_validate_rejects_duplicate_venues() {
    let workspace = Workspace::new();
    let path = workspace.write(
        "bad.toml",
        r#"
[[venues]]
id = "kalshi"
kind = "prediction"
codec = "kalshi"
ws_url = "wss://example.com/a"

[[venues]]
id = "kalshi"
kind = "prediction"
codec = "kalshi"
ws_url = "wss://example.com/b"
"#,
    );
    crossbook()
        .args(["config", "validate", "-c"])
        .arg(path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("venues.id"));
}

#[test]
fn config_show_prints_effective_toml() {
    let workspace = Workspace::new();
    crossbook()
        .args(["config", "show", "-c"])
        .arg(workspace.config_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[scanner]"))
        .stdout(predicate::str::contains("interval_ms = 1000"));
}

#[test]
fn match_score_reports_identical_titles_as_a_match() {
    let value = json_stdout(crossbook().args(["match", "score", TITLE, TITLE, "--json"]));
    assert_eq!(value["command"], "match.score");
    assert_eq!(value["is_match"], true);
    assert!(value["score"].as_f64().unwrap() > 0.99);
}

#[test]
fn match_explain_lists_shared_entities() {
    let value = json_stdout(crossbook().args([
        "match",
        "explain",
        "Chiefs vs Eagles Super Bowl",
        "Kansas City Chiefs beat the Eagles",
        "--json",
    ]));
    assert_eq!(value["command"], "match.explain");
    assert!(value["shared_entities"].as_array().is_some());
}

#[test]
fn status_without_heartbeat_is_not_ready() {
    let workspace = Workspace::new();
    let value = json_stdout(
        crossbook()
            .args(["status", "--json", "-c"])
            .arg(workspace.config_path()),
    );
    assert_eq!(value["command"], "status");
    assert_eq!(value["status"], "no_heartbeat");
    assert_eq!(value["ready"], false);

    crossbook()
        .args(["status", "--ready", "-q", "-c"])
        .arg(workspace.config_path())
        .assert()
        .failure();
}

#[tokio::test]
async fn dry_fire_stats_replays_the_journal() {
    let workspace = Workspace::new();
    seed_journal(&workspace).await;

    let value = json_stdout(
        crossbook()
            .args(["dry-fire", "stats", "--json", "-c"])
            .arg(workspace.config_path()),
    );
    assert_eq!(value["command"], "dry-fire.stats");
    assert_eq!(value["total"], 2);
    assert_eq!(value["by_status"]["SIMULATED"], 1);
    assert_eq!(value["by_status"]["REJECTED_BY_RISK"], 1);
    assert_eq!(value["by_venue"]["kalshi"], 2);
}

#[tokio::test]
async fn dry_fire_list_filters_by_status() {
    let workspace = Workspace::new();
    seed_journal(&workspace).await;

    let value = json_stdout(
        crossbook()
            .args(["dry-fire", "list", "--json", "--status", "REJECTED_BY_RISK", "-c"])
            .arg(workspace.config_path()),
    );
    let records = value["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "REJECTED_BY_RISK");
}

#[tokio::test]
async fn dry_fire_export_writes_csv() {
    let workspace = Workspace::new();
    seed_journal(&workspace).await;
    let out = workspace.root().join("exports/dry_fire.csv");

    crossbook()
        .args(["dry-fire", "export", "-c"])
        .arg(workspace.config_path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(out).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().next().unwrap().starts_with("opportunity_id"));
}
