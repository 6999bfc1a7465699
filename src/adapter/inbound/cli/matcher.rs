//! Handlers for the `match` command group.

use serde_json::json;

use crate::adapter::inbound::cli::command::MatchArgs;
use crate::adapter::inbound::cli::output;
use crate::application::matcher::{MarketMatcher, MatchExplanation};
use crate::error::Result;
use crate::infrastructure::config::Config;

fn explanation(args: &MatchArgs) -> Result<MatchExplanation> {
    let matcher = match &args.config {
        Some(path) => Config::load(path)?.matcher.matcher(),
        None => MarketMatcher::default(),
    };
    let a = matcher.parse(&args.title_a);
    let b = matcher.parse(&args.title_b);
    Ok(matcher.explain(&a, &b))
}

/// Execute `match score`.
pub fn score(args: &MatchArgs) -> Result<()> {
    let explanation = explanation(args)?;

    if output::is_json() {
        output::command_json(
            "match.score",
            json!({
                "score": explanation.score.score,
                "threshold": explanation.threshold,
                "is_match": explanation.is_match,
                "flipped": explanation.score.flipped,
            }),
        );
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    let verdict = if explanation.is_match {
        output::positive("match")
    } else {
        output::negative("no match")
    };
    output::field("Score", format!("{:.3}", explanation.score.score));
    output::field("Threshold", format!("{:.2}", explanation.threshold));
    output::field("Verdict", verdict);
    if explanation.score.flipped {
        output::note("opposite directions: YES hedges YES");
    }
    Ok(())
}

/// Execute `match explain`.
pub fn explain(args: &MatchArgs) -> Result<()> {
    let explanation = explanation(args)?;

    if output::is_json() {
        output::command_json("match.explain", serde_json::to_value(&explanation)?);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    for line in explanation.to_string().lines() {
        println!("  {line}");
    }
    Ok(())
}
