//! Turning final positions and engine score reports into an outcome.

use crate::board::Colour;
use crate::result::Outcome;

/// A well-formed `final_score` report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreReport {
    /// `0`
    Jigo,
    /// `B+3`, `W+7.5`, or `B+` when the margin is missing or unusable.
    Win {
        /// Winning colour.
        winner: Colour,
        /// Positive margin, if the report gave one.
        margin: Option<f64>,
    },
}

/// Parse a `final_score` response. Returns `None` if it is ill-formed.
///
/// A margin that is missing, unparsable or not positive gives a winner-only
/// report.
pub fn parse_score_report(text: &str) -> Option<ScoreReport> {
    let s = text.trim().to_ascii_lowercase();
    if s.parse::<f64>().is_ok_and(|v| v == 0.0) {
        return Some(ScoreReport::Jigo);
    }
    let (colour, margin) = s.split_once('+')?;
    let winner = match colour {
        "b" => Colour::Black,
        "w" => Colour::White,
        _ => return None,
    };
    let margin = margin
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m > 0.0);
    Some(ScoreReport::Win { winner, margin })
}

/// `B+3`, `W+7.5`; integral margins have no decimal point.
pub fn format_win(winner: Colour, margin: Option<f64>) -> String {
    match margin {
        Some(m) => format!("{}+{m}", winner.score_prefix()),
        None => format!("{}+", winner.score_prefix()),
    }
}

impl ScoreReport {
    fn into_outcome(self) -> Outcome {
        match self {
            ScoreReport::Jigo => Outcome::jigo(),
            ScoreReport::Win {
                winner,
                margin: Some(m),
            } => Outcome::win(winner, format_win(winner, Some(m)), None),
            ScoreReport::Win {
                winner,
                margin: None,
            } => Outcome::win(winner, format_win(winner, None), Some("unknown margin")),
        }
    }
}

/// Outcome of scoring by the players' own reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// What the game's result should say.
    pub outcome: Outcome,
    /// True if the two reports named different winners.
    pub disagreed: bool,
}

/// Combine the raw `final_score` reports of black and white.
///
/// Missing and ill-formed reports count as no report. The rules are
/// symmetric in the two colours.
pub fn resolve_reports(black: Option<&str>, white: Option<&str>) -> Resolution {
    let reports: Vec<ScoreReport> = [black, white]
        .into_iter()
        .flatten()
        .filter_map(parse_score_report)
        .collect();
    let agreed = |outcome| Resolution {
        outcome,
        disagreed: false,
    };
    match reports.as_slice() {
        [] => agreed(Outcome::unknown("no score reported")),
        [single] => agreed(single.into_outcome()),
        [ScoreReport::Jigo, ScoreReport::Jigo] => agreed(Outcome::jigo()),
        [ScoreReport::Win {
            winner: w1,
            margin: m1,
        }, ScoreReport::Win {
            winner: w2,
            margin: m2,
        }] if w1 == w2 => {
            let margin = match (m1, m2) {
                (Some(a), Some(b)) if a == b => Some(*a),
                _ => None,
            };
            agreed(
                ScoreReport::Win {
                    winner: *w1,
                    margin,
                }
                .into_outcome(),
            )
        }
        _ => Resolution {
            outcome: Outcome::unknown("players disagreed"),
            disagreed: true,
        },
    }
}

/// Score the final position by area, black's points minus white's, less komi.
pub fn internal_outcome(area_score: i32, komi: f64) -> Outcome {
    let score = f64::from(area_score) - komi;
    if score == 0.0 {
        Outcome::jigo()
    } else if score > 0.0 {
        Outcome::win(Colour::Black, format_win(Colour::Black, Some(score)), None)
    } else {
        Outcome::win(Colour::White, format_win(Colour::White, Some(-score)), None)
    }
}
