use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Transport-level feed failures. Retried with backoff by the feed client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("not connected")]
    NotConnected,

    #[error("reconnect attempts exhausted after {attempts} tries")]
    Terminal { attempts: u32 },
}

/// A single malformed inbound frame. The frame is dropped; the connection stays up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {venue} message: {reason}")]
pub struct ParseError {
    pub venue: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(venue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            reason: reason.into(),
        }
    }
}

/// External store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("store misconfigured: {0}")]
    Misconfigured(String),

    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("failed to serialize record: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("engine channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}
