//! Weighted similarity between two parsed markets.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::parse::{Direction, MarketDate, ParsedMarket};

/// Relative weights of the similarity terms plus the entity gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub entity: f64,
    pub date: f64,
    pub number: f64,
    pub direction: f64,
    /// Below this entity overlap the composite is scaled down by
    /// `entity / entity_floor`, so unrelated subjects cannot pass on shared
    /// dates and phrasing alone.
    pub entity_floor: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            entity: 0.55,
            date: 0.2,
            number: 0.15,
            direction: 0.1,
            entity_floor: 0.5,
        }
    }
}

/// Per-term breakdown of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub score: f64,
    pub entity: f64,
    pub date: f64,
    pub number: f64,
    pub direction: f64,
    /// The questions resolve oppositely: opposite directions on the same
    /// subject, or the same win/lose verb with the subjects swapped. YES on
    /// one side then hedges YES on the other.
    pub flipped: bool,
}

pub(super) fn compare(a: &ParsedMarket, b: &ParsedMarket, weights: &MatchWeights) -> MatchScore {
    let entity = jaccard(&a.entities, &b.entities);
    let date = presence_agreement(&a.dates, &b.dates, |x, y| x.agrees(y));
    let number = presence_agreement_set(&a.numbers, &b.numbers);
    let (direction, flipped) = direction_term(a, b);

    let total = weights.entity + weights.date + weights.number + weights.direction;
    let mut score = if total > 0.0 {
        (weights.entity * entity
            + weights.date * date
            + weights.number * number
            + weights.direction * direction)
            / total
    } else {
        0.0
    };
    if weights.entity_floor > 0.0 && entity < weights.entity_floor {
        score *= entity / weights.entity_floor;
    }

    MatchScore {
        score: score.clamp(0.0, 1.0),
        entity,
        date,
        number,
        direction,
        flipped,
    }
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// 1.0 when neither side mentions the feature, 0.5 when only one does,
/// otherwise 1.0 or 0.0 on agreement.
fn presence_agreement<T>(a: &[T], b: &[T], agrees: impl Fn(&T, &T) -> bool) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => {
            if a.iter().any(|x| b.iter().any(|y| agrees(x, y))) {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn presence_agreement_set(a: &BTreeSet<Decimal>, b: &BTreeSet<Decimal>) -> f64 {
    let a: Vec<Decimal> = a.iter().copied().collect();
    let b: Vec<Decimal> = b.iter().copied().collect();
    presence_agreement(&a, &b, |x, y| x == y)
}

fn direction_term(a: &ParsedMarket, b: &ParsedMarket) -> (f64, bool) {
    let swapped = subjects_swapped(a, b);
    match (a.direction, b.direction) {
        (None, None) => (1.0, false),
        (Some(x), Some(y)) if x == y => (1.0, swapped),
        (Some(x), Some(y)) if x.opposite() == y => (1.0, !swapped),
        (Some(_), Some(_)) => (0.5, false),
        _ => (0.75, false),
    }
}

/// "A beat B" against "B beat A": each subject is the other side's opponent.
fn subjects_swapped(a: &ParsedMarket, b: &ParsedMarket) -> bool {
    match (&a.subject, &b.subject) {
        (Some(x), Some(y)) => x != y && b.entities.contains(x) && a.entities.contains(y),
        _ => false,
    }
}

/// Human-readable comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct MatchExplanation {
    pub title_a: String,
    pub title_b: String,
    pub score: MatchScore,
    pub threshold: f64,
    pub is_match: bool,
    pub shared_entities: Vec<String>,
    pub only_a: Vec<String>,
    pub only_b: Vec<String>,
    pub dates_a: Vec<MarketDate>,
    pub dates_b: Vec<MarketDate>,
    pub numbers_a: Vec<Decimal>,
    pub numbers_b: Vec<Decimal>,
    pub direction_a: Option<Direction>,
    pub direction_b: Option<Direction>,
    pub subject_a: Option<String>,
    pub subject_b: Option<String>,
}

impl MatchExplanation {
    pub(super) fn new(a: &ParsedMarket, b: &ParsedMarket, score: MatchScore, threshold: f64) -> Self {
        Self {
            title_a: a.title.clone(),
            title_b: b.title.clone(),
            is_match: score.score >= threshold,
            score,
            threshold,
            shared_entities: a.entities.intersection(&b.entities).cloned().collect(),
            only_a: a.entities.difference(&b.entities).cloned().collect(),
            only_b: b.entities.difference(&a.entities).cloned().collect(),
            dates_a: a.dates.clone(),
            dates_b: b.dates.clone(),
            numbers_a: a.numbers.iter().copied().collect(),
            numbers_b: b.numbers.iter().copied().collect(),
            direction_a: a.direction,
            direction_b: b.direction,
            subject_a: a.subject.clone(),
            subject_b: b.subject.clone(),
        }
    }
}

fn list<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn direction_label(direction: Option<Direction>) -> &'static str {
    direction.map_or("-", Direction::as_str)
}

fn subject_label(subject: Option<&str>) -> String {
    subject.map_or_else(String::new, |s| format!(" ({s})"))
}

impl fmt::Display for MatchExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_match { "MATCH" } else { "NO MATCH" };
        writeln!(
            f,
            "{verdict}: {:.3} (threshold {:.2}){}",
            self.score.score,
            self.threshold,
            if self.score.flipped { ", sides flipped" } else { "" }
        )?;
        writeln!(f, "  A: {}", self.title_a)?;
        writeln!(f, "  B: {}", self.title_b)?;
        writeln!(
            f,
            "  entities  {:.3}  shared [{}]  only A [{}]  only B [{}]",
            self.score.entity,
            list(&self.shared_entities),
            list(&self.only_a),
            list(&self.only_b)
        )?;
        writeln!(
            f,
            "  dates     {:.3}  A [{}]  B [{}]",
            self.score.date,
            list(&self.dates_a),
            list(&self.dates_b)
        )?;
        writeln!(
            f,
            "  numbers   {:.3}  A [{}]  B [{}]",
            self.score.number,
            list(&self.numbers_a),
            list(&self.numbers_b)
        )?;
        write!(
            f,
            "  direction {:.3}  A {}{}  B {}{}",
            self.score.direction,
            direction_label(self.direction_a),
            subject_label(self.subject_a.as_deref()),
            direction_label(self.direction_b),
            subject_label(self.subject_b.as_deref())
        )
    }
}
