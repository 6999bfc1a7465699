//! Typed append-only journals over a [`LogStore`].
//!
//! Records are stored as one JSON document each, partitioned by the UTC date
//! of their own timestamp.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::domain::{ArbitrageOpportunity, DryFireTradeLog};
use crate::error::StorageError;
use crate::port::outbound::store::LogStore;

/// A record type with its own log stream.
pub trait JournalRecord: Serialize + DeserializeOwned + Send + Sync {
    const STREAM: &'static str;

    /// Timestamp that selects the date partition.
    fn recorded_at(&self) -> DateTime<Utc>;
}

impl JournalRecord for ArbitrageOpportunity {
    const STREAM: &'static str = "opportunities";

    fn recorded_at(&self) -> DateTime<Utc> {
        self.detected_at()
    }
}

impl JournalRecord for DryFireTradeLog {
    const STREAM: &'static str = "dry-fire";

    fn recorded_at(&self) -> DateTime<Utc> {
        self.logged_at
    }
}

/// One decoded page. Undecodable lines are counted, not returned.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalPage<R> {
    pub records: Vec<R>,
    pub next_cursor: Option<usize>,
    pub total: usize,
    pub skipped: usize,
}

pub struct Journal<R> {
    store: Arc<dyn LogStore>,
    _record: PhantomData<fn() -> R>,
}

pub type OpportunityJournal = Journal<ArbitrageOpportunity>;
pub type DryFireJournal = Journal<DryFireTradeLog>;

impl<R> Clone for Journal<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: JournalRecord> Journal<R> {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub async fn append(&self, record: &R) -> Result<(), StorageError> {
        let line = serde_json::to_string(record)?;
        self.store
            .append(R::STREAM, &date_key(record.recorded_at()), &line)
            .await
    }

    /// Read up to `limit` records of `date` starting at `cursor`.
    pub async fn page(
        &self,
        date: NaiveDate,
        cursor: usize,
        limit: usize,
    ) -> Result<JournalPage<R>, StorageError> {
        let page = self
            .store
            .read_page(R::STREAM, &date.to_string(), cursor, limit)
            .await?;
        let (records, skipped) = decode_all(&page.records);
        Ok(JournalPage {
            records,
            next_cursor: page.next_cursor,
            total: page.total,
            skipped,
        })
    }

    pub async fn read_date(&self, date: NaiveDate) -> Result<Vec<R>, StorageError> {
        let lines = self.store.read_all(R::STREAM, &date.to_string()).await?;
        Ok(decode_all(&lines).0)
    }

    /// Every record at or after `since`, oldest partition first.
    pub async fn read_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<R>, StorageError> {
        let first_day = since.map(|at| at.date_naive());
        let mut records = Vec::new();
        for date in self.dates().await? {
            if first_day.is_some_and(|first| date < first) {
                continue;
            }
            records.extend(
                self.read_date(date)
                    .await?
                    .into_iter()
                    .filter(|r| since.map_or(true, |at| r.recorded_at() >= at)),
            );
        }
        Ok(records)
    }

    /// Partitions that hold at least one record, ascending.
    pub async fn dates(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let mut dates: Vec<NaiveDate> = self
            .store
            .dates(R::STREAM)
            .await?
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }
}

/// `YYYY-MM-DD` partition for a timestamp.
#[must_use]
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn decode_all<R: DeserializeOwned>(lines: &[String]) -> (Vec<R>, usize) {
    let mut skipped = 0;
    let records = lines
        .iter()
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "Skipping undecodable journal record");
                None
            }
        })
        .collect();
    (records, skipped)
}
