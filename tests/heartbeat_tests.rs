//! Heartbeat publication and stateless reads through a shared store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;

use crossbook::adapter::outbound::store::{FileKvStore, MemoryStore};
use crossbook::adapter::outbound::venue::KalshiCodec;
use crossbook::application::feed::{FeedClient, FeedClientConfig, FeedHandle};
use crossbook::application::heartbeat::{HeartbeatPublisher, HeartbeatReader, HeartbeatStatus};
use crossbook::application::state::StateHandle;
use crossbook::domain::{ConnectionState, MarketKind, WorkerHeartbeat, WorkerState};
use crossbook::port::outbound::store::KvStore;
use crossbook::testkit::transport::ScriptedTransport;

const KEY: &str = "worker:heartbeat";

async fn stored(store: &dyn KvStore) -> WorkerHeartbeat {
    let raw = store.get(KEY).await.unwrap().expect("heartbeat written");
    serde_json::from_str(&raw).unwrap()
}

/// A kalshi feed over a transport that connects immediately.
async fn connected_feed(state: &StateHandle) -> (FeedHandle, watch::Sender<bool>) {
    let client = FeedClient::new(
        "kalshi",
        MarketKind::Prediction,
        ScriptedTransport::new(),
        KalshiCodec::new(),
        FeedClientConfig::default(),
        state.clone(),
    );
    let handle = client.handle();
    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(client.run(shutdown));
    handle.connect().await.unwrap();
    handle.wait_for_state(ConnectionState::Connected).await.unwrap();
    (handle, stop)
}

#[tokio::test]
async fn running_worker_with_a_connected_venue_is_ready() {
    let store = Arc::new(MemoryStore::new());
    let (state, _task) = StateHandle::spawn(5, 16);
    let (feed, _stop) = connected_feed(&state).await;

    let mut publisher = HeartbeatPublisher::new(store.clone(), KEY, state, vec![feed]);
    assert!(publisher.publish(WorkerState::Running).await);

    let status = HeartbeatReader::new(Some(store), KEY).read().await;
    assert_eq!(status.status, HeartbeatStatus::Ok);
    assert!(status.worker_present);
    assert!(status.ready, "{:?}", status.reason);
    assert_eq!(status.tick, Some(1));
    assert_eq!(status.venues.len(), 1);
    assert!(status.venues[0].connected);
    assert_eq!(status.circuit_breaker.map(|b| b.is_open), Some(false));
}

#[tokio::test]
async fn staleness_boundary_is_inclusive() {
    let store = Arc::new(MemoryStore::new());
    let (state, _task) = StateHandle::spawn(5, 16);
    let mut publisher = HeartbeatPublisher::new(store.clone(), KEY, state, Vec::new());
    publisher.publish(WorkerState::Running).await;
    let updated_at = stored(store.as_ref()).await.updated_at;

    let reader = HeartbeatReader::new(Some(store), KEY).with_stale_ms(10_000);

    let at_edge = reader.read_at(updated_at + ChronoDuration::milliseconds(10_000)).await;
    assert!(at_edge.worker_present);
    assert_eq!(at_edge.heartbeat_age_ms, Some(10_000));
    assert_eq!(at_edge.reason.as_deref(), Some("no venue connected"));

    let past_edge = reader.read_at(updated_at + ChronoDuration::milliseconds(10_001)).await;
    assert_eq!(past_edge.status, HeartbeatStatus::Ok);
    assert!(!past_edge.worker_present);
    assert!(!past_edge.ready);
}

#[tokio::test]
async fn stopping_heartbeat_carries_shutdown_metadata() {
    let store = Arc::new(MemoryStore::new());
    let (state, _task) = StateHandle::spawn(5, 16);
    let started_at = Utc::now() - ChronoDuration::minutes(5);
    let mut publisher =
        HeartbeatPublisher::new(store.clone(), KEY, state, Vec::new()).with_started_at(started_at);
    publisher.publish(WorkerState::Running).await;

    let requested_at = Utc::now();
    assert!(publisher.publish_stopping("shutdown requested", requested_at).await);

    let status = HeartbeatReader::new(Some(store), KEY).read().await;
    assert_eq!(status.state, Some(WorkerState::Stopping));
    assert_eq!(status.tick, Some(2));
    assert!(!status.ready);
    let shutdown = status.shutdown.expect("shutdown info");
    assert_eq!(shutdown.reason, "shutdown requested");
    assert_eq!(shutdown.started_at, started_at);
    assert_eq!(shutdown.requested_at, requested_at);
    assert_eq!(status.reason.as_deref(), Some("worker stopping: shutdown requested"));
}

#[tokio::test(start_paused = true)]
async fn publisher_loop_writes_every_interval_until_stopped() {
    let store = Arc::new(MemoryStore::new());
    let (state, _task) = StateHandle::spawn(5, 16);
    let publisher = HeartbeatPublisher::new(store.clone(), KEY, state, Vec::new())
        .with_interval(Duration::from_secs(5));
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn(publisher.run(shutdown));

    tokio::time::sleep(Duration::from_secs(12)).await;
    stop.send(true).unwrap();
    let publisher = task.await.unwrap();

    assert_eq!(publisher.tick(), 3);
    let heartbeat = stored(store.as_ref()).await;
    assert_eq!(heartbeat.tick, 3);
    assert_eq!(heartbeat.state, WorkerState::Running);
}

#[tokio::test]
async fn separate_reader_sees_file_backed_heartbeat() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _task) = StateHandle::spawn(5, 16);
    let mut publisher =
        HeartbeatPublisher::new(Arc::new(FileKvStore::new(dir.path())), KEY, state, Vec::new());
    publisher.publish(WorkerState::Starting).await;

    let reader = HeartbeatReader::new(Some(Arc::new(FileKvStore::new(dir.path()))), KEY);
    let status = reader.read().await;
    assert_eq!(status.status, HeartbeatStatus::Ok);
    assert_eq!(status.state, Some(WorkerState::Starting));
    assert_eq!(status.reason.as_deref(), Some("worker is STARTING"));
}

#[tokio::test]
async fn missing_and_garbled_heartbeats_are_classified() {
    let store = Arc::new(MemoryStore::new());
    let reader = HeartbeatReader::new(Some(store.clone()), KEY);
    assert_eq!(reader.read().await.status, HeartbeatStatus::NoHeartbeat);

    store.set(KEY, "{not json").await.unwrap();
    assert_eq!(reader.read().await.status, HeartbeatStatus::ParseError);

    let unconfigured = HeartbeatReader::new(None, KEY).read().await;
    assert_eq!(unconfigured.status, HeartbeatStatus::Misconfigured);
    assert!(!unconfigured.worker_present);
}
