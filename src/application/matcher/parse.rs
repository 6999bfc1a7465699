//! Title parsing: entities, dates, numeric thresholds and direction.
//!
//! [`parse`] is a pure function of the title text and the alias table.
//! Parsed markets are recomputed on demand rather than cached.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::Serialize;

use super::alias::AliasTable;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|\
                      november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})\b").expect("iso date pattern")
});
static SLASH_DATE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{2}|\d{4})\b")
        .expect("m/d/y date pattern")
});
static SLASH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<month>\d{1,2})/(?P<day>\d{1,2})\b").expect("m/d date pattern")
});
static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?P<month>{MONTHS})\.?\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(?P<year>\d{{4}})\b)?"
    ))
    .expect("month-first date pattern")
});
static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?P<month>{MONTHS})\b\.?(?:,?\s+(?P<year>\d{{4}})\b)?"
    ))
    .expect("day-first date pattern")
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?P<cur>\$)|\b)(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:\s*(?P<suffix>k|m|b|bn|thousand|million|billion)\b|(?P<pct>%)|\b)",
    )
    .expect("number pattern")
});

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "as", "at", "be", "before", "after", "by", "end", "for", "from",
    "game", "has", "have", "if", "in", "is", "it", "its", "market", "match", "most", "least",
    "of", "on", "or", "over", "price", "than", "that", "the", "this", "to", "v", "versus", "vs",
    "what", "which", "who", "will", "winner", "with", "yes", "no",
];

/// A calendar date extracted from a title. The year is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MarketDate {
    pub year: Option<i32>,
    pub month: u32,
    pub day: u32,
}

impl MarketDate {
    /// Same month and day, and the same year when both carry one.
    #[must_use]
    pub fn agrees(&self, other: &Self) -> bool {
        self.month == other.month
            && self.day == other.day
            && match (self.year, other.year) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for MarketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{year:04}-{:02}-{:02}", self.month, self.day),
            None => write!(f, "{:02}-{:02}", self.month, self.day),
        }
    }
}

/// Directional qualifier of a market question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
    Win,
    Lose,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Above => Self::Below,
            Self::Below => Self::Above,
            Self::Win => Self::Lose,
            Self::Lose => Self::Win,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PHRASE_DIRECTIONS: &[(&str, &str, Direction)] = &[
    ("at", "least", Direction::Above),
    ("more", "than", Direction::Above),
    ("greater", "than", Direction::Above),
    ("less", "than", Direction::Below),
    ("fewer", "than", Direction::Below),
    ("at", "most", Direction::Below),
];

fn word_direction(token: &str) -> Option<Direction> {
    match token {
        "above" | "over" | "higher" | "exceed" | "exceeds" | "exceeding" | "reach" | "reaches"
        | "surpass" | "surpasses" => Some(Direction::Above),
        "below" | "under" | "lower" | "beneath" => Some(Direction::Below),
        "win" | "wins" | "beat" | "beats" | "defeat" | "defeats" => Some(Direction::Win),
        "lose" | "loses" | "losing" => Some(Direction::Lose),
        _ => None,
    }
}

/// Normalized view of a market title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMarket {
    pub title: String,
    pub entities: BTreeSet<String>,
    pub dates: Vec<MarketDate>,
    pub numbers: BTreeSet<Decimal>,
    pub direction: Option<Direction>,
    /// Entity just before the win/lose verb: the side the question is about.
    pub subject: Option<String>,
}

/// Parse a title into entities, dates, numbers and a direction.
#[must_use]
pub fn parse(title: &str, aliases: &AliasTable) -> ParsedMarket {
    let lowered = title.to_lowercase();
    let mut direction = symbol_direction(&lowered);

    let (dates, text) = extract_dates(&lowered);
    let (numbers, text) = extract_numbers(&text);

    let raw: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let tokens = aliases.normalize(&raw);

    let mut entities = BTreeSet::new();
    let mut subject = None;
    let mut last_entity: Option<&str> = None;
    let mut i = 0;
    while i < tokens.len() {
        if let Some(next) = tokens.get(i + 1) {
            if let Some((_, _, found)) = PHRASE_DIRECTIONS
                .iter()
                .find(|(first, second, _)| tokens[i] == *first && next == second)
            {
                direction = direction.or(Some(*found));
                i += 2;
                continue;
            }
        }

        let token = tokens[i].as_str();
        if let Some(found) = word_direction(token) {
            if direction.is_none() && matches!(found, Direction::Win | Direction::Lose) {
                subject = last_entity.map(str::to_string);
            }
            direction = direction.or(Some(found));
        } else if token.chars().count() > 1 && !STOPWORDS.contains(&token) {
            entities.insert(token.to_string());
            last_entity = Some(token);
        }
        i += 1;
    }

    ParsedMarket {
        title: title.to_string(),
        entities,
        dates,
        numbers,
        direction,
        subject,
    }
}

fn symbol_direction(text: &str) -> Option<Direction> {
    if text.contains('>') || text.contains('≥') {
        Some(Direction::Above)
    } else if text.contains('<') || text.contains('≤') {
        Some(Direction::Below)
    } else {
        None
    }
}

fn extract_dates(text: &str) -> (Vec<MarketDate>, String) {
    let patterns: [&Regex; 5] = [
        &ISO_DATE,
        &SLASH_DATE_YEAR,
        &MONTH_FIRST,
        &DAY_FIRST,
        &SLASH_DATE,
    ];

    let mut dates = Vec::new();
    let mut remaining = text.to_string();
    for pattern in patterns {
        dates.extend(pattern.captures_iter(&remaining).filter_map(|c| date_from(&c)));
        remaining = pattern.replace_all(&remaining, " ").into_owned();
    }
    dates.sort();
    dates.dedup();
    (dates, remaining)
}

fn date_from(caps: &Captures<'_>) -> Option<MarketDate> {
    let month_text = caps.name("month")?.as_str();
    let month = month_text
        .parse::<u32>()
        .ok()
        .or_else(|| month_number(month_text))?;
    let day = caps.name("day")?.as_str().parse::<u32>().ok()?;
    let year = match caps.name("year") {
        Some(year) => {
            let value = year.as_str().parse::<i32>().ok()?;
            Some(if value < 100 { 2000 + value } else { value })
        }
        None => None,
    };

    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(MarketDate {
        year,
        month,
        day,
    })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn extract_numbers(text: &str) -> (BTreeSet<Decimal>, String) {
    let numbers = NUMBER
        .captures_iter(text)
        .filter_map(|c| number_from(&c))
        .collect();
    let remaining = NUMBER.replace_all(text, " ").into_owned();
    (numbers, remaining)
}

fn number_from(caps: &Captures<'_>) -> Option<Decimal> {
    let raw = caps.name("num")?.as_str().replace(',', "");
    let value = Decimal::from_str(&raw).ok()?;
    let suffix = caps.name("suffix").map(|m| m.as_str());
    let is_plain = caps.name("cur").is_none() && suffix.is_none() && caps.name("pct").is_none();

    // Bare four-digit years carry no threshold.
    if is_plain && value.fract().is_zero() && value >= Decimal::from(1900) && value <= Decimal::from(2100) {
        return None;
    }

    let multiplier = match suffix {
        Some("k" | "thousand") => Decimal::from(1_000),
        Some("m" | "million") => Decimal::from(1_000_000),
        Some("b" | "bn" | "billion") => Decimal::from(1_000_000_000),
        _ => Decimal::ONE,
    };
    value.checked_mul(multiplier).map(|v| v.normalize())
}
