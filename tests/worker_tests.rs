//! End-to-end worker runs over scripted venue feeds and an in-memory store.

mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crossbook::adapter::outbound::store::MemoryStore;
use crossbook::application::journal::{DryFireJournal, OpportunityJournal};
use crossbook::domain::{DryFireStatus, Side, WorkerHeartbeat, WorkerState};
use crossbook::infrastructure::catalog::Catalog;
use crossbook::infrastructure::config::venue::VenueConfig;
use crossbook::infrastructure::config::Config;
use crossbook::infrastructure::factory::store::Stores;
use crossbook::infrastructure::flags::DEFAULT_FLAGS_KEY;
use crossbook::infrastructure::worker::{RunSummary, Worker};
use crossbook::port::outbound::feed::Frame;
use crossbook::port::outbound::store::KvStore;
use crossbook::testkit::transport::ScriptedTransport;
use support::workspace::CATALOG;

const CONFIG: &str = r#"
[[venues]]
id = "kalshi"
kind = "prediction"
codec = "kalshi"
ws_url = "wss://example.com/kalshi"

[[venues]]
id = "book"
kind = "sportsbook"
codec = "odds"
ws_url = "ws://localhost:9001/odds"

[scanner]
interval_ms = 20

[heartbeat]
interval_secs = 1

[store]
kind = "memory"
"#;

/// Kalshi at 41/59 against a book at 1.6/2.8: YES on kalshi hedges NO on the book.
fn transport_for(venue: &VenueConfig) -> ScriptedTransport {
    let frame = match venue.id.as_str() {
        "kalshi" => r#"{"type":"orderbook_snapshot","sid":1,"seq":1,"msg":{"market_ticker":"KXSB-KC","yes":[[40,10]],"no":[[58,10]]}}"#,
        _ => r#"{"type":"odds","updates":[{"outcome":"sb-kc:yes","price":"1.6"},{"outcome":"sb-kc:no","price":"2.8"}]}"#,
    };
    ScriptedTransport::new().with_frames(vec![Frame::Text(frame.to_string())])
}

struct Harness {
    store: Arc<MemoryStore>,
    stop: watch::Sender<bool>,
    worker: tokio::task::JoinHandle<crossbook::error::Result<RunSummary>>,
}

fn start(store: Arc<MemoryStore>) -> Harness {
    let config = Config::parse_toml(CONFIG).unwrap();
    let catalog = Catalog::parse_json(CATALOG).unwrap();
    let stores = Stores {
        kv: store.clone(),
        logs: store.clone(),
    };
    let (stop, shutdown) = watch::channel(false);
    let worker = tokio::spawn(Worker::new(config, catalog, stores).run_with(transport_for, shutdown));
    Harness {
        store,
        stop,
        worker,
    }
}

impl Harness {
    async fn stop(self) -> RunSummary {
        self.stop.send(true).unwrap();
        self.worker.await.unwrap().unwrap()
    }

    async fn wait_for_opportunity(&self) {
        let journal = OpportunityJournal::new(self.store.clone());
        for _ in 0..250 {
            if !journal.read_since(None).await.unwrap().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("worker never journaled an opportunity");
    }
}

#[tokio::test]
async fn detects_journals_and_simulates_a_cross_venue_pair() {
    let harness = start(Arc::new(MemoryStore::new()));
    harness.wait_for_opportunity().await;
    // A few more passes over unchanged quotes must not re-report the pair.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let store = harness.store.clone();
    let summary = harness.stop().await;

    let opportunities = OpportunityJournal::new(store.clone()).read_since(None).await.unwrap();
    assert_eq!(opportunities.len(), 1);
    let opp = &opportunities[0];
    assert_eq!(opp.leg_a().venue.as_str(), "book");
    assert_eq!(opp.leg_a().side, Side::No);
    assert_eq!(opp.leg_b().venue.as_str(), "kalshi");
    assert_eq!(opp.leg_b().side, Side::Yes);

    let logs = DryFireJournal::new(store.clone()).read_since(None).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, DryFireStatus::Simulated, "{:?}", logs[0].reasons);
    assert_eq!(logs[0].opportunity_id, *opp.id());

    assert!(summary.cycles > 1);
    assert_eq!(summary.opportunities, 1);
    assert_eq!(summary.simulated, 1);
}

#[tokio::test]
async fn final_heartbeat_is_stopping_with_shutdown_reason() {
    let harness = start(Arc::new(MemoryStore::new()));
    harness.wait_for_opportunity().await;
    let store = harness.store.clone();
    harness.stop().await;

    let raw = store.get("worker:heartbeat").await.unwrap().expect("heartbeat");
    let heartbeat: WorkerHeartbeat = serde_json::from_str(&raw).unwrap();
    assert_eq!(heartbeat.state, WorkerState::Stopping);
    assert_eq!(heartbeat.venues.len(), 2);
    assert!(heartbeat.tick >= 2);
    let shutdown = heartbeat.shutdown.expect("shutdown info");
    assert_eq!(shutdown.reason, "shutdown requested");
    assert!(shutdown.requested_at >= heartbeat.started_at);
}

#[tokio::test]
async fn runtime_flag_turns_dry_fire_off_without_stopping_detection() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(DEFAULT_FLAGS_KEY, r#"{"dry_fire_enabled":false}"#)
        .await
        .unwrap();
    let harness = start(store);
    harness.wait_for_opportunity().await;
    let store = harness.store.clone();
    let summary = harness.stop().await;

    assert!(DryFireJournal::new(store).read_since(None).await.unwrap().is_empty());
    assert_eq!(summary.opportunities, 1);
    assert_eq!(summary.simulated, 0);
}

#[tokio::test]
async fn runtime_flag_can_pause_the_matcher() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(DEFAULT_FLAGS_KEY, r#"{"matcher_enabled":false}"#)
        .await
        .unwrap();
    let harness = start(store);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let store = harness.store.clone();
    let summary = harness.stop().await;

    assert!(summary.cycles > 0);
    assert_eq!(summary.opportunities, 0);
    assert!(OpportunityJournal::new(store).read_since(None).await.unwrap().is_empty());
}
