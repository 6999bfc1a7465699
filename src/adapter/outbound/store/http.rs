//! REST key-value store speaking the Upstash command protocol.
//!
//! Every operation is a `POST {url}` with a JSON command array such as
//! `["SET", key, value]` and a bearer token. Responses are
//! `{"result": ...}` or `{"error": "..."}`. Log partitions are Redis lists
//! keyed `{stream}:{date}`, with a `{stream}:dates` set indexing them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;
use crate::port::outbound::store::{partition_key, KvStore, LogPage, LogStore};

/// Environment variable holding the bearer token.
pub const KV_TOKEN_ENV: &str = "CROSSBOOK_KV_TOKEN";

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpKvStore {
    client: Client,
    url: String,
    token: String,
    timeout: Duration,
}

impl HttpKvStore {
    /// # Errors
    ///
    /// Returns [`StorageError::Misconfigured`] when the URL or token is empty
    /// or the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let url = url.into().trim_end_matches('/').to_string();
        let token = token.into();
        if url.is_empty() {
            return Err(StorageError::Misconfigured("store url is not set".into()));
        }
        if token.is_empty() {
            return Err(StorageError::Misconfigured(format!("{KV_TOKEN_ENV} is not set")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Misconfigured(e.to_string()))?;
        Ok(Self {
            client,
            url,
            token,
            timeout,
        })
    }

    /// Build from a configured URL and the token in [`KV_TOKEN_ENV`].
    ///
    /// # Errors
    ///
    /// See [`HttpKvStore::new`].
    pub fn from_env(url: Option<&str>, timeout: Duration) -> Result<Self, StorageError> {
        let token = std::env::var(KV_TOKEN_ENV).unwrap_or_default();
        Self::new(url.unwrap_or_default(), token, timeout)
    }

    async fn command(&self, args: &[&str]) -> Result<Value, StorageError> {
        debug!(command = args.first().copied().unwrap_or_default(), "KV command");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::Misconfigured(format!("store rejected token: {status}")));
        }
        let reply: Reply = response
            .json()
            .await
            .map_err(|e| StorageError::Unreachable(format!("invalid reply ({status}): {e}")))?;
        if let Some(error) = reply.error {
            return Err(StorageError::Unreachable(error));
        }
        if !status.is_success() {
            return Err(StorageError::Unreachable(format!("HTTP {status}")));
        }
        Ok(reply.result)
    }

    fn transport_error(&self, err: &reqwest::Error) -> StorageError {
        if err.is_timeout() {
            StorageError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            StorageError::Unreachable(err.to_string())
        }
    }
}

fn strings(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn dates_key(stream: &str) -> String {
    format!("{stream}:dates")
}

#[async_trait]
impl KvStore for HttpKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.command(&["SET", key, value]).await.map(|_| ())
    }
}

#[async_trait]
impl LogStore for HttpKvStore {
    async fn append(&self, stream: &str, date: &str, record: &str) -> Result<(), StorageError> {
        self.command(&["RPUSH", &partition_key(stream, date), record])
            .await?;
        self.command(&["SADD", &dates_key(stream), date]).await?;
        Ok(())
    }

    async fn read_page(
        &self,
        stream: &str,
        date: &str,
        cursor: usize,
        limit: usize,
    ) -> Result<LogPage, StorageError> {
        let key = partition_key(stream, date);
        let total = match self.command(&["LLEN", &key]).await? {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()).unwrap_or(0),
            _ => 0,
        };
        if limit == 0 || cursor >= total {
            return Ok(LogPage {
                records: Vec::new(),
                next_cursor: None,
                total,
            });
        }
        let stop = cursor.saturating_add(limit).min(total) - 1;
        let records = strings(
            self.command(&["LRANGE", &key, &cursor.to_string(), &stop.to_string()])
                .await?,
        );
        let end = cursor + records.len();
        Ok(LogPage {
            records,
            next_cursor: (end < total).then_some(end),
            total,
        })
    }

    async fn read_all(&self, stream: &str, date: &str) -> Result<Vec<String>, StorageError> {
        Ok(strings(
            self.command(&["LRANGE", &partition_key(stream, date), "0", "-1"])
                .await?,
        ))
    }

    async fn dates(&self, stream: &str) -> Result<Vec<String>, StorageError> {
        let mut dates = strings(self.command(&["SMEMBERS", &dates_key(stream)]).await?);
        dates.sort();
        Ok(dates)
    }
}
