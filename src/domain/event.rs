//! Cross-venue event groups.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::VenueId;
use super::market::Market;

/// Sport classification derived from title keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    Ncaaf,
    Ncaab,
    Soccer,
    Mma,
    Tennis,
    Golf,
    Esports,
    /// Not a sporting event (politics, crypto, economics, ...).
    None,
}

impl Sport {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nfl => "nfl",
            Self::Nba => "nba",
            Self::Mlb => "mlb",
            Self::Nhl => "nhl",
            Self::Ncaaf => "ncaaf",
            Self::Ncaab => "ncaab",
            Self::Soccer => "soccer",
            Self::Mma => "mma",
            Self::Tennis => "tennis",
            Self::Golf => "golf",
            Self::Esports => "esports",
            Self::None => "none",
        }
    }

    #[must_use]
    pub const fn is_sport(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the real-world event behind a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Pre,
    Live,
    Ended,
}

impl EventStatus {
    /// Derive status from the earliest known start and expiry across members.
    #[must_use]
    pub fn derive(
        event_start: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if expires_at.is_some_and(|expiry| expiry <= now) {
            return Self::Ended;
        }
        match event_start {
            Some(start) if start <= now => Self::Live,
            _ => Self::Pre,
        }
    }
}

/// Markets on two or more venues believed to reference one real-world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEventGroup {
    pub matchup_key: String,
    pub sport: Sport,
    pub status: EventStatus,
    pub markets: Vec<Market>,
    /// Lowest pairwise similarity that admitted a member.
    pub confidence: f64,
}

impl MatchedEventGroup {
    /// Create a group, enforcing the minimum venue count.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InsufficientVenues`] if the markets span fewer
    /// than `min_platforms` distinct venues (never fewer than two).
    pub fn try_new(
        matchup_key: String,
        sport: Sport,
        status: EventStatus,
        markets: Vec<Market>,
        confidence: f64,
        min_platforms: usize,
    ) -> Result<Self, DomainError> {
        let required = min_platforms.max(2);
        let actual = distinct_venues(&markets).len();
        if markets.len() < 2 || actual < required {
            return Err(DomainError::InsufficientVenues { required, actual });
        }
        Ok(Self {
            matchup_key,
            sport,
            status,
            markets,
            confidence,
        })
    }

    #[must_use]
    pub fn venues(&self) -> BTreeSet<&VenueId> {
        distinct_venues(&self.markets)
    }
}

fn distinct_venues(markets: &[Market]) -> BTreeSet<&VenueId> {
    markets.iter().map(Market::venue).collect()
}
