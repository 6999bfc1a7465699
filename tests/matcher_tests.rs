//! Title matching as configured from TOML.

use crossbook::application::matcher::MarketMatcher;
use crossbook::infrastructure::config::Config;

const RAPTORS: &str = "Will the Raptors win the 2026 NBA Finals?";
const DINOS: &str = "Will the Tor Dinos win the 2026 NBA Finals?";

fn score(matcher: &MarketMatcher, a: &str, b: &str) -> f64 {
    matcher.similarity(&matcher.parse(a), &matcher.parse(b))
}

#[test]
fn configured_aliases_join_venue_spellings() {
    let plain = Config::parse_toml("").unwrap().matcher.matcher();
    let aliased = Config::parse_toml("[matcher.aliases]\nraptors = [\"tor dinos\"]\n")
        .unwrap()
        .matcher
        .matcher();

    let before = score(&plain, RAPTORS, DINOS);
    let after = score(&aliased, RAPTORS, DINOS);

    assert!(after > before, "{before} -> {after}");
    let explanation = aliased.explain(&aliased.parse(RAPTORS), &aliased.parse(DINOS));
    assert!(explanation.is_match);
    assert!(explanation.only_a.is_empty() && explanation.only_b.is_empty());
}

#[test]
fn configured_threshold_decides_the_verdict() {
    let a = "Will Bitcoin close above $100k on Dec 31, 2025?";
    let b = "BTC above 100,000 by 12/31/2025";
    let strict = Config::parse_toml("[matcher]\nthreshold = 1.0\n").unwrap().matcher.matcher();
    let loose = Config::parse_toml("[matcher]\nthreshold = 0.3\n").unwrap().matcher.matcher();

    let strict_score = strict.compare(&strict.parse(a), &strict.parse(b));
    let loose_score = loose.compare(&loose.parse(a), &loose.parse(b));

    assert!(loose.is_match(&loose_score));
    assert_eq!(strict.is_match(&strict_score), strict_score.score >= 1.0);
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let matcher = MarketMatcher::default();
    let titles = [
        RAPTORS,
        DINOS,
        "Will the Chiefs win Super Bowl LX?",
        "Chiefs vs Eagles: Super Bowl LX winner",
        "Will ETH be below $3,000 on March 1?",
        "Lakers vs Celtics",
    ];
    for a in titles {
        for b in titles {
            let ab = score(&matcher, a, b);
            let ba = score(&matcher, b, a);
            assert!((ab - ba).abs() < 1e-9, "{a} / {b}: {ab} vs {ba}");
            assert!((0.0..=1.0).contains(&ab), "{a} / {b}: {ab}");
        }
    }
}

#[test]
fn identical_titles_always_match() {
    let matcher = MarketMatcher::default();
    let parsed = matcher.parse("Will the Chiefs win Super Bowl LX?");
    let score = matcher.compare(&parsed, &parsed);
    assert!(matcher.is_match(&score));
    assert!(!score.flipped);
}

#[test]
fn swapped_subjects_are_reported() {
    let matcher = MarketMatcher::default();
    let explanation = matcher.explain(
        &matcher.parse("Lakers beat Celtics"),
        &matcher.parse("Celtics beat Lakers"),
    );
    assert!(explanation.score.flipped);
    assert_eq!(explanation.subject_a.as_deref(), Some("lakers"));
    assert_eq!(explanation.subject_b.as_deref(), Some("celtics"));
    assert!(explanation.to_string().contains("sides flipped"));
}
