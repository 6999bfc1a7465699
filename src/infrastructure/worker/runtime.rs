//! Worker lifecycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::cycle::ScanCycle;
use crate::application::feed::{BreakerObserver, FeedClient, FeedHandle, ObserverSet};
use crate::application::heartbeat::HeartbeatPublisher;
use crate::application::journal::{DryFireJournal, OpportunityJournal};
use crate::application::state::StateHandle;
use crate::domain::{VenueId, WorkerState};
use crate::error::{Error, Result};
use crate::infrastructure::catalog::Catalog;
use crate::infrastructure::config::venue::VenueConfig;
use crate::infrastructure::config::Config;
use crate::infrastructure::factory::engine::{build_registry, build_scanner, build_simulator};
use crate::infrastructure::factory::feed::{build_codec, build_transport};
use crate::infrastructure::factory::store::Stores;
use crate::infrastructure::flags::RuntimeFlags;
use crate::port::outbound::feed::FeedTransport;

const SHUTDOWN_REASON: &str = "shutdown requested";

/// Totals over one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub opportunities: usize,
    pub simulated: usize,
}

pub struct Worker {
    config: Config,
    catalog: Catalog,
    stores: Stores,
}

struct Feed {
    handle: FeedHandle,
    task: JoinHandle<()>,
}

impl Worker {
    #[must_use]
    pub fn new(config: Config, catalog: Catalog, stores: Stores) -> Self {
        Self {
            config,
            catalog,
            stores,
        }
    }

    /// Run over websocket transports until `shutdown` flips to true.
    ///
    /// # Errors
    ///
    /// Returns an error if a venue codec cannot be built or the state task
    /// disappears.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
        self.run_with(build_transport, shutdown).await
    }

    /// Run with caller-supplied transports, one per enabled venue.
    ///
    /// Shutdown order: heartbeat loop, final `STOPPING` write, feeds, state.
    ///
    /// # Errors
    ///
    /// Same as [`Worker::run`].
    pub async fn run_with<T, F>(self, mut transport: F, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary>
    where
        T: FeedTransport + 'static,
        F: FnMut(&VenueConfig) -> T,
    {
        let started_at = Utc::now();
        let config = self.config;
        info!(
            venues = config.enabled_venues().count(),
            markets = self.catalog.len(),
            dry_fire = config.dry_fire,
            "Starting crossbook worker"
        );
        if self.catalog.is_empty() {
            warn!("Catalog is empty, no markets will be scanned");
        }

        let (state, state_task) =
            StateHandle::spawn(config.breaker.failure_threshold, config.feed.channel_capacity);
        let (feed_stop, feed_shutdown) = watch::channel(false);

        let mut feeds = Vec::new();
        for venue in config.enabled_venues() {
            let feed = start_feed(&config, venue, transport(venue), &state, feed_shutdown.clone())?;
            let subscriptions = self.catalog.subscriptions(feed.handle.venue());
            debug!(venue = %venue.id, instruments = subscriptions.len(), "Subscribing catalog markets");
            feed.handle.subscribe(subscriptions).await?;
            feed.handle.connect().await?;
            feeds.push(feed);
        }
        warn_unconfigured(&config, &self.catalog.venues());

        let mut publisher = HeartbeatPublisher::new(
            self.stores.kv.clone(),
            config.heartbeat.key.clone(),
            state.clone(),
            feeds.iter().map(|feed| feed.handle.clone()).collect(),
        )
        .with_interval(Duration::from_secs(config.heartbeat.interval_secs))
        .with_write_timeout(Duration::from_millis(config.heartbeat.write_timeout_ms))
        .with_started_at(started_at);
        publisher.publish(WorkerState::Starting).await;
        let (heartbeat_stop, heartbeat_shutdown) = watch::channel(false);
        let heartbeat = tokio::spawn(publisher.run(heartbeat_shutdown));

        let mut cycle = ScanCycle::new(
            state.clone(),
            self.catalog.markets(),
            config.matcher.matcher(),
            build_registry(&config),
            build_scanner(&config),
            build_simulator(&config),
            OpportunityJournal::new(self.stores.logs.clone()),
            DryFireJournal::new(self.stores.logs.clone()),
        )
        .with_dry_fire(config.dry_fire)
        .with_min_profit_margin(config.scanner.min_profit_margin);

        let flags_timeout = Duration::from_millis(config.store.timeout_ms);
        let mut summary = RunSummary::default();
        let mut ticker = interval(Duration::from_millis(config.scanner.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let flags =
                        RuntimeFlags::load(self.stores.kv.as_ref(), &config.store.flags_key, flags_timeout).await;
                    match cycle.run_once(&flags, Utc::now()).await {
                        Ok(report) => {
                            summary.cycles += 1;
                            summary.opportunities += report.opportunities.len();
                            summary.simulated += report.simulated();
                        }
                        Err(Error::ChannelClosed) => {
                            error!("State task stopped, ending scan loop");
                            break;
                        }
                        Err(e) => warn!(error = %e, "Scan cycle failed"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        let requested_at = Utc::now();
        info!(cycles = summary.cycles, "Shutting down worker");
        let _ = heartbeat_stop.send(true);
        match heartbeat.await {
            Ok(mut publisher) => {
                publisher.publish_stopping(SHUTDOWN_REASON, requested_at).await;
            }
            Err(e) => error!(error = %e, "Heartbeat task failed"),
        }

        let _ = feed_stop.send(true);
        for feed in feeds {
            if let Err(e) = feed.task.await {
                error!(venue = %feed.handle.venue(), error = %e, "Feed task failed");
            }
        }

        drop(cycle);
        drop(state);
        if let Err(e) = state_task.await {
            error!(error = %e, "State task failed");
        }

        info!(
            cycles = summary.cycles,
            opportunities = summary.opportunities,
            simulated = summary.simulated,
            "Worker stopped"
        );
        Ok(summary)
    }
}

fn start_feed<T>(
    config: &Config,
    venue: &VenueConfig,
    transport: T,
    state: &StateHandle,
    shutdown: watch::Receiver<bool>,
) -> Result<Feed>
where
    T: FeedTransport + 'static,
{
    let codec = build_codec(venue)?;
    let observers = ObserverSet::new().with(Arc::new(BreakerObserver::new(state.clone())));
    let client = FeedClient::new(
        venue.id.as_str(),
        venue.kind,
        transport,
        codec,
        config.feed.client_config(),
        state.clone(),
    )
    .with_observers(observers);
    let handle = client.handle();
    let task = tokio::spawn(client.run(shutdown));
    Ok(Feed { handle, task })
}

fn warn_unconfigured(config: &Config, catalog_venues: &[VenueId]) {
    for venue in catalog_venues {
        if !config.enabled_venues().any(|v| v.id == venue.as_str()) {
            warn!(venue = %venue, "Catalog venue has no enabled feed; its markets stay unpriced");
        }
    }
}
