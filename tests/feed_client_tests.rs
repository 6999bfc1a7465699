//! Feed client lifecycle against scripted transports.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crossbook::adapter::outbound::venue::{KalshiCodec, OddsCodec};
use crossbook::application::feed::{
    Backoff, FeedClient, FeedClientConfig, FeedHandle, ObserverSet, Subscription,
};
use crossbook::application::state::StateHandle;
use crossbook::domain::{ConnectionState, MarketKind, PriceKey, PriceView, Side, VenueConnection};
use crossbook::error::FeedError;
use crossbook::port::outbound::feed::Frame;
use crossbook::testkit::domain::{prediction, sportsbook};
use crossbook::testkit::transport::{RecordingObserver, ScriptedTransport};

const TITLE: &str = "Will the Chiefs win Super Bowl LX?";
const SNAPSHOT: &str = r#"{"type":"orderbook_snapshot","sid":2,"seq":1,"msg":{"market_ticker":"KX-1","yes":[[40,10],[42,5]],"no":[[56,3]]}}"#;

fn config(max_attempts: u32) -> FeedClientConfig {
    FeedClientConfig {
        backoff: Backoff::new(Duration::from_millis(100), Duration::from_secs(1)),
        max_attempts,
        connect_timeout: Duration::from_secs(2),
        ping_interval: Duration::from_secs(30),
        command_capacity: 16,
    }
}

struct Running {
    handle: FeedHandle,
    state: StateHandle,
    observer: Arc<RecordingObserver>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

fn start(transport: ScriptedTransport, max_attempts: u32) -> Running {
    let (state, _state_task) = StateHandle::spawn(5, 64);
    let observer = RecordingObserver::new();
    let client = FeedClient::new(
        "kalshi",
        MarketKind::Prediction,
        transport,
        KalshiCodec::new(),
        config(max_attempts),
        state.clone(),
    )
    .with_observers(ObserverSet::new().with(observer.clone()));
    let handle = client.handle();
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn(client.run(shutdown));
    Running {
        handle,
        state,
        observer,
        stop,
        task,
    }
}

fn kalshi_subscription() -> Subscription {
    let market = prediction("kalshi", "KX-1", TITLE, dec!(50), dec!(50), Utc::now());
    Subscription::with_complement("KX-1", &market)
}

async fn until(handle: &FeedHandle, check: impl FnMut(&VenueConnection) -> bool) -> VenueConnection {
    let mut rx = handle.watch();
    let status = timeout(Duration::from_secs(120), rx.wait_for(check))
        .await
        .expect("feed status never reached")
        .expect("feed client dropped");
    (*status).clone()
}

async fn cached(state: &StateHandle, key: PriceKey) -> PriceView {
    for _ in 0..100 {
        if let Some(view) = state.get_price(key.clone()).await.unwrap() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("price never cached")
}

#[tokio::test(start_paused = true)]
async fn snapshot_prices_both_outcomes_after_subscribing() {
    let transport = ScriptedTransport::new().with_frames(vec![Frame::Text(SNAPSHOT.into())]);
    let counts = transport.counts();
    let feed = start(transport, 3);

    feed.handle.subscribe(vec![kalshi_subscription()]).await.unwrap();
    feed.handle.connect().await.unwrap();
    until(&feed.handle, |s| s.messages_received == 1).await;

    let yes = cached(&feed.state, PriceKey::new("kalshi", "KX-1", "KX-1:yes")).await;
    let no = cached(&feed.state, PriceKey::new("kalshi", "KX-1", "KX-1:no")).await;
    assert_eq!(yes.price.price, dec!(43));
    assert_eq!(no.price.price, dec!(57));
    assert_eq!(yes.price.spread, Some(dec!(2)));

    let sent = counts.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains(r#""cmd":"subscribe""#));
    assert!(sent[0].contains("KX-1"));
    assert_eq!(feed.handle.status().subscriptions, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_connects_back_off_then_recover() {
    let failures = vec![
        Err(FeedError::Connection("refused".into())),
        Err(FeedError::Connection("refused".into())),
        Ok(()),
    ];
    let transport = ScriptedTransport::new().with_connect_results(failures);
    let counts = transport.counts();
    let feed = start(transport, 5);

    feed.handle.connect().await.unwrap();
    let status = until(&feed.handle, |s| s.state == ConnectionState::Connected).await;

    assert_eq!(counts.connects(), 3);
    assert_eq!(status.reconnect_attempts, 0);
    assert_eq!(
        feed.observer.states(),
        vec![
            ConnectionState::Connecting,
            ConnectionState::Reconnecting,
            ConnectionState::Connecting,
            ConnectionState::Reconnecting,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_park_in_error_until_reconnected() {
    let failures = (0..3)
        .map(|_| Err(FeedError::Connection("refused".into())))
        .collect();
    let transport = ScriptedTransport::new().with_connect_results(failures);
    let counts = transport.counts();
    let feed = start(transport, 2);

    feed.handle.connect().await.unwrap();
    let parked = until(&feed.handle, |s| s.state == ConnectionState::Error).await;
    assert_eq!(counts.connects(), 3);
    assert_eq!(parked.reconnect_attempts, 2);
    let last = feed.observer.changes().pop().expect("state changes recorded");
    assert!(last.reason.unwrap_or_default().contains("exhausted"));

    feed.handle.connect().await.unwrap();
    until(&feed.handle, |s| s.state == ConnectionState::Connected).await;
    assert_eq!(counts.connects(), 4);
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_counted_and_skipped() {
    let transport = ScriptedTransport::new().with_frames(vec![
        Frame::Text("[1,2".into()),
        Frame::Text(SNAPSHOT.into()),
    ]);
    let feed = start(transport, 3);

    feed.handle.subscribe(vec![kalshi_subscription()]).await.unwrap();
    feed.handle.connect().await.unwrap();
    let status = until(&feed.handle, |s| s.messages_received == 1).await;

    assert_eq!(status.parse_errors, 1);
    assert_eq!(status.state, ConnectionState::Connected);
    assert!(status.last_message_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn remote_close_reconnects_and_resubscribes() {
    let transport = ScriptedTransport::new()
        .with_frames(vec![Frame::Closed {
            reason: "server going away".into(),
        }])
        .with_frames(vec![Frame::Text(SNAPSHOT.into())]);
    let counts = transport.counts();
    let feed = start(transport, 3);

    feed.handle.subscribe(vec![kalshi_subscription()]).await.unwrap();
    feed.handle.connect().await.unwrap();
    until(&feed.handle, |s| s.messages_received == 1).await;

    assert_eq!(counts.connects(), 2);
    let subscribes = counts
        .sent()
        .iter()
        .filter(|m| m.contains(r#""cmd":"subscribe""#))
        .count();
    assert_eq!(subscribes, 2);
    assert!(feed
        .observer
        .changes()
        .iter()
        .any(|c| c.reason.as_deref() == Some("server going away")));
}

#[tokio::test(start_paused = true)]
async fn idle_connection_sends_keepalive_pings() {
    let transport = ScriptedTransport::new();
    let counts = transport.counts();
    let feed = start(transport, 3);

    feed.handle.connect().await.unwrap();
    until(&feed.handle, |s| s.state == ConnectionState::Connected).await;
    tokio::time::sleep(Duration::from_secs(95)).await;

    assert_eq!(counts.pings(), 3);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_and_reports_disconnected() {
    let feed = start(ScriptedTransport::new(), 3);
    feed.handle.connect().await.unwrap();
    until(&feed.handle, |s| s.state == ConnectionState::Connected).await;

    feed.stop.send(true).unwrap();
    feed.task.await.unwrap();

    assert_eq!(feed.handle.status().state, ConnectionState::Disconnected);
    assert_eq!(feed.observer.states().last(), Some(&ConnectionState::Disconnected));
}

#[tokio::test(start_paused = true)]
async fn sportsbook_outcomes_are_priced_independently() {
    let (state, _state_task) = StateHandle::spawn(5, 64);
    let market = sportsbook("book", "sb-kc", TITLE, dec!(2.0), dec!(2.0), Utc::now());
    let transport = ScriptedTransport::new().with_frames(vec![Frame::Text(
        r#"{"type":"odds","updates":[{"outcome":"sb-kc:yes","price":"1.8"},{"outcome":"sb-kc:no","price":"2.25"}]}"#.into(),
    )]);
    let client = FeedClient::new(
        "book",
        MarketKind::Sportsbook,
        transport,
        OddsCodec::new(),
        config(3),
        state.clone(),
    );
    let handle = client.handle();
    let (_stop, shutdown) = watch::channel(false);
    tokio::spawn(client.run(shutdown));

    handle
        .subscribe(vec![
            Subscription::side("sb-kc:yes", &market, Side::Yes),
            Subscription::side("sb-kc:no", &market, Side::No),
        ])
        .await
        .unwrap();
    handle.connect().await.unwrap();
    until(&handle, |s| s.messages_received == 1).await;

    let yes = cached(&state, PriceKey::new("book", "sb-kc", "sb-kc:yes")).await;
    let no = cached(&state, PriceKey::new("book", "sb-kc", "sb-kc:no")).await;
    assert_eq!(yes.price.price, dec!(1.8));
    assert_eq!(no.price.price, dec!(2.25));
}
