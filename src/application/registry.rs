//! Cross-venue event grouping.
//!
//! Groups are rebuilt from the current market list on every call, so a group
//! disappears as soon as a member closes or re-evaluation drops its
//! similarity below the matcher threshold.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::application::matcher::{MarketMatcher, ParsedMarket};
use crate::domain::{EventStatus, Market, MatchedEventGroup, Sport};

const SPORT_KEYWORDS: &[(Sport, &[&str])] = &[
    (
        Sport::Nfl,
        &["nfl", "super bowl", "touchdown", "chiefs", "eagles", "49ers", "cowboys", "patriots", "packers", "bills", "ravens"],
    ),
    (
        Sport::Nba,
        &["nba", "lakers", "celtics", "warriors", "knicks", "nuggets", "bucks", "76ers", "heat", "suns", "mavericks"],
    ),
    (Sport::Mlb, &["mlb", "world series", "yankees", "dodgers", "mets", "red sox", "astros", "home run"]),
    (Sport::Nhl, &["nhl", "stanley cup", "bruins", "rangers", "maple leafs", "oilers", "panthers"]),
    (Sport::Ncaaf, &["ncaaf", "college football", "heisman", "cfp"]),
    (Sport::Ncaab, &["ncaab", "march madness", "final four", "college basketball"]),
    (
        Sport::Soccer,
        &["premier league", "champions league", "la liga", "serie a", "bundesliga", "mls", "world cup", "fc", "manchester united", "manchester city", "arsenal", "chelsea", "liverpool", "real madrid", "barcelona"],
    ),
    (Sport::Mma, &["ufc", "mma", "bellator"]),
    (Sport::Tennis, &["tennis", "atp", "wta", "wimbledon", "roland garros", "us open"]),
    (Sport::Golf, &["golf", "pga", "masters", "ryder cup", "liv"]),
    (Sport::Esports, &["esports", "league of legends", "lol", "dota", "cs2", "counter-strike", "valorant"]),
];

/// Classify a title by sport keyword. Non-sport titles return [`Sport::None`].
#[must_use]
pub fn classify_sport(title: &str) -> Sport {
    let lowered = format!(" {} ", title.to_lowercase().replace(|c: char| !c.is_alphanumeric() && c != '-', " "));
    SPORT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(&format!(" {k} "))))
        .map_or(Sport::None, |(sport, _)| *sport)
}

/// Stable key for a group: sorted entities plus the first date, if any.
#[must_use]
pub fn matchup_key(parsed: &ParsedMarket) -> String {
    let entities: Vec<&str> = parsed.entities.iter().map(String::as_str).collect();
    let mut key = entities.join("-");
    if let Some(date) = parsed.dates.first() {
        key.push('@');
        key.push_str(&date.to_string());
    }
    key
}

/// Builds [`MatchedEventGroup`]s from a flat market list.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    min_platforms: usize,
    sports_only: bool,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new(2)
    }
}

impl EventRegistry {
    #[must_use]
    pub fn new(min_platforms: usize) -> Self {
        Self {
            min_platforms: min_platforms.max(2),
            sports_only: false,
        }
    }

    /// Only keep groups classified as a sport.
    #[must_use]
    pub fn sports_only(mut self, enabled: bool) -> Self {
        self.sports_only = enabled;
        self
    }

    /// Greedy grouping: each open market joins the best-scoring group whose
    /// anchor it matches and which has no member from its venue yet.
    #[must_use]
    pub fn build(
        &self,
        matcher: &MarketMatcher,
        markets: &[Market],
        now: DateTime<Utc>,
    ) -> Vec<MatchedEventGroup> {
        struct Pending<'a> {
            anchor: ParsedMarket,
            members: Vec<&'a Market>,
            confidence: f64,
        }

        let mut pending: Vec<Pending<'_>> = Vec::new();
        for market in markets.iter().filter(|m| !m.is_closed(now)) {
            let parsed = matcher.parse(market.title());
            let best = pending
                .iter_mut()
                .filter(|group| group.members.iter().all(|m| m.venue() != market.venue()))
                .map(|group| {
                    let score = matcher.similarity(&group.anchor, &parsed);
                    (group, score)
                })
                .filter(|(_, score)| *score >= matcher.threshold())
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match best {
                Some((group, score)) => {
                    group.members.push(market);
                    group.confidence = group.confidence.min(score);
                }
                None => pending.push(Pending {
                    anchor: parsed,
                    members: vec![market],
                    confidence: 1.0,
                }),
            }
        }

        pending
            .into_iter()
            .filter_map(|group| {
                let sport = classify_sport(&group.anchor.title);
                if self.sports_only && !sport.is_sport() {
                    return None;
                }
                let start = group.members.iter().filter_map(|m| m.event_start()).min();
                let expiry = group.members.iter().filter_map(|m| m.expires_at()).min();
                let key = matchup_key(&group.anchor);
                let result = MatchedEventGroup::try_new(
                    key,
                    sport,
                    EventStatus::derive(start, expiry, now),
                    group.members.into_iter().cloned().collect(),
                    group.confidence,
                    self.min_platforms,
                );
                match result {
                    Ok(group) => Some(group),
                    Err(err) => {
                        debug!(error = %err, "Dropping single-venue group");
                        None
                    }
                }
            })
            .collect()
    }
}
