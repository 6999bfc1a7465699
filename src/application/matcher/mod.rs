//! Cross-venue market matching.
//!
//! A [`MarketMatcher`] owns its alias table and scoring weights. The scanner
//! and the event registry receive it by reference; aliases are extended
//! through [`MarketMatcher::add_alias`] rather than any global table.

mod alias;
mod parse;
mod score;

pub use alias::AliasTable;
pub use parse::{parse, Direction, MarketDate, ParsedMarket};
pub use score::{MatchExplanation, MatchScore, MatchWeights};

/// Default similarity at or above which two markets are the same event.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

/// Fuzzy identity resolution across venues.
#[derive(Debug, Clone)]
pub struct MarketMatcher {
    aliases: AliasTable,
    weights: MatchWeights,
    threshold: f64,
}

impl Default for MarketMatcher {
    fn default() -> Self {
        Self::new(AliasTable::with_defaults(), MatchWeights::default(), DEFAULT_MATCH_THRESHOLD)
    }
}

impl MarketMatcher {
    #[must_use]
    pub fn new(aliases: AliasTable, weights: MatchWeights, threshold: f64) -> Self {
        Self {
            aliases,
            weights,
            threshold,
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn parse(&self, title: &str) -> ParsedMarket {
        parse(title, &self.aliases)
    }

    /// Composite similarity in `[0, 1]`.
    #[must_use]
    pub fn similarity(&self, a: &ParsedMarket, b: &ParsedMarket) -> f64 {
        self.compare(a, b).score
    }

    /// Full per-term breakdown, including whether sides are flipped.
    #[must_use]
    pub fn compare(&self, a: &ParsedMarket, b: &ParsedMarket) -> MatchScore {
        score::compare(a, b, &self.weights)
    }

    #[must_use]
    pub fn is_match(&self, score: &MatchScore) -> bool {
        score.score >= self.threshold
    }

    #[must_use]
    pub fn explain(&self, a: &ParsedMarket, b: &ParsedMarket) -> MatchExplanation {
        MatchExplanation::new(a, b, self.compare(a, b), self.threshold)
    }

    /// Extend the alias table, e.g. `add_alias(&["btc"], "bitcoin")`.
    pub fn add_alias<S: AsRef<str>>(&mut self, tokens: &[S], canonical: &str) {
        self.aliases
            .add(tokens.iter().map(|t| AsRef::<str>::as_ref(t)), canonical);
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(a: &str, b: &str) -> MatchScore {
        let matcher = MarketMatcher::default();
        matcher.compare(&matcher.parse(a), &matcher.parse(b))
    }

    #[test]
    fn same_event_phrased_differently_matches() {
        let s = score(
            "Will the Lakers beat the Celtics on Dec 25?",
            "Los Angeles Lakers vs Boston Celtics - December 25 winner",
        );
        assert!(s.score >= DEFAULT_MATCH_THRESHOLD, "{s:?}");
        assert!(!s.flipped);
    }

    #[test]
    fn different_teams_do_not_match() {
        let s = score("Lakers vs Celtics", "Lakers vs Warriors");
        assert!(s.score < DEFAULT_MATCH_THRESHOLD, "{s:?}");
    }

    #[test]
    fn different_assets_do_not_match_despite_shared_threshold_and_date() {
        let s = score(
            "Will Bitcoin be above $100k on Dec 31, 2025?",
            "Will Ethereum be above $100k on Dec 31, 2025?",
        );
        assert!(s.score < DEFAULT_MATCH_THRESHOLD, "{s:?}");
    }

    #[test]
    fn opposite_directions_match_with_sides_flipped() {
        let s = score(
            "BTC above $100,000 on 12/31/2025",
            "Bitcoin below 100k on December 31, 2025",
        );
        assert!(s.score >= DEFAULT_MATCH_THRESHOLD, "{s:?}");
        assert!(s.flipped);
    }

    #[test]
    fn swapped_win_subjects_flip_sides() {
        let s = score("Will the Lakers beat the Celtics?", "Will the Celtics beat the Lakers?");
        assert!(s.score >= DEFAULT_MATCH_THRESHOLD, "{s:?}");
        assert!(s.flipped);

        let s = score("Will the Lakers beat the Celtics?", "Will the Celtics lose to the Lakers?");
        assert!(s.score >= DEFAULT_MATCH_THRESHOLD, "{s:?}");
        assert!(!s.flipped);
    }

    #[test]
    fn mismatched_thresholds_reduce_score() {
        let same = score("Bitcoin above 100k", "BTC above $100,000");
        let different = score("Bitcoin above 100k", "BTC above $120,000");
        assert!(same.score > different.score);
        assert_eq!(different.number, 0.0);
    }

    #[test]
    fn runtime_alias_changes_matching() {
        let mut matcher = MarketMatcher::default();
        let a = "Will Zed win the 2026 election?";
        let b = "Will Zedediah Smith win the 2026 election?";
        let before = matcher.similarity(&matcher.parse(a), &matcher.parse(b));

        matcher.add_alias(&["zedediah", "smith"], "zed");
        let after = matcher.similarity(&matcher.parse(a), &matcher.parse(b));
        assert!(after > before);
        assert!(after >= DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn explanation_lists_entity_differences() {
        let matcher = MarketMatcher::default();
        let explanation =
            matcher.explain(&matcher.parse("Lakers vs Celtics"), &matcher.parse("Lakers vs Warriors"));
        assert!(!explanation.is_match);
        assert_eq!(explanation.shared_entities, vec!["lakers"]);
        assert_eq!(explanation.only_a, vec!["celtics"]);
        assert_eq!(explanation.only_b, vec!["warriors"]);
        let text = explanation.to_string();
        assert!(text.starts_with("NO MATCH"));
        assert!(text.contains("only B [warriors]"));
    }
}
