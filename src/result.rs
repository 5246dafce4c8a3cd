//! Game results.
//!
//! A [`GameResult`] is built once, when a game ends, and never changes
//! afterwards. It serializes with `serde`, so a result can be carried out of
//! whatever worker ran the game and rebuilt as an equal value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::Colour;

/// How a game ended, before player identifiers are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Winning colour, `None` for jigo or an unknown result.
    pub winner: Option<Colour>,
    /// Score string: `B+3`, `W+R`, `B+F`, `B+`, `0`, `?` or `Void`.
    pub score: String,
    /// True if the game ended by forfeit.
    pub is_forfeit: bool,
    /// True for a drawn game.
    pub is_jigo: bool,
    /// Extra information, eg the reason for a forfeit.
    pub detail: Option<String>,
}

impl Outcome {
    /// A win with the given score string.
    pub fn win(winner: Colour, score: String, detail: Option<&str>) -> Self {
        Outcome {
            winner: Some(winner),
            score,
            is_forfeit: false,
            is_jigo: false,
            detail: detail.map(str::to_string),
        }
    }

    /// A win because the loser broke the protocol or the rules.
    pub fn forfeit(winner: Colour, detail: String) -> Self {
        Outcome {
            winner: Some(winner),
            score: format!("{}+F", winner.score_prefix()),
            is_forfeit: true,
            is_jigo: false,
            detail: Some(detail),
        }
    }

    /// A win by resignation.
    pub fn resignation(winner: Colour) -> Self {
        Self::win(winner, format!("{}+R", winner.score_prefix()), None)
    }

    /// A win claimed by the winner's engine.
    pub fn claim(winner: Colour) -> Self {
        Self::win(winner, format!("{}+", winner.score_prefix()), Some("claim"))
    }

    /// A drawn game.
    pub fn jigo() -> Self {
        Outcome {
            winner: None,
            score: "0".to_string(),
            is_forfeit: false,
            is_jigo: true,
            detail: None,
        }
    }

    /// The winner could not be determined.
    pub fn unknown(detail: &str) -> Self {
        Outcome {
            winner: None,
            score: "?".to_string(),
            is_forfeit: false,
            is_jigo: false,
            detail: Some(detail.to_string()),
        }
    }

    /// The game was abandoned without a result.
    pub fn void(detail: &str) -> Self {
        Outcome {
            score: "Void".to_string(),
            ..Self::unknown(detail)
        }
    }
}

/// The result of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    player_b: String,
    player_w: String,
    winning_colour: Option<Colour>,
    score: String,
    is_forfeit: bool,
    is_jigo: bool,
    detail: Option<String>,
    cpu_times: BTreeMap<String, Option<f64>>,
}

impl GameResult {
    /// Attach player identifiers and CPU times to an outcome.
    pub fn new(
        player_b: impl Into<String>,
        player_w: impl Into<String>,
        outcome: Outcome,
        cpu_times: BTreeMap<String, Option<f64>>,
    ) -> Self {
        GameResult {
            player_b: player_b.into(),
            player_w: player_w.into(),
            winning_colour: outcome.winner,
            score: outcome.score,
            is_forfeit: outcome.is_forfeit,
            is_jigo: outcome.is_jigo,
            detail: outcome.detail,
            cpu_times,
        }
    }

    /// Identifier of the player with `colour`.
    pub fn player(&self, colour: Colour) -> &str {
        match colour {
            Colour::Black => &self.player_b,
            Colour::White => &self.player_w,
        }
    }

    /// Black's identifier.
    pub fn player_b(&self) -> &str {
        &self.player_b
    }

    /// White's identifier.
    pub fn player_w(&self) -> &str {
        &self.player_w
    }

    /// Colour to player identifier, black first.
    pub fn players(&self) -> [(Colour, &str); 2] {
        [
            (Colour::Black, self.player_b.as_str()),
            (Colour::White, self.player_w.as_str()),
        ]
    }

    /// Colour of the winner, if there is one.
    pub fn winning_colour(&self) -> Option<Colour> {
        self.winning_colour
    }

    /// Colour of the loser, if there is one.
    pub fn losing_colour(&self) -> Option<Colour> {
        self.winning_colour.map(Colour::opponent)
    }

    /// Identifier of the winner, if there is one.
    pub fn winning_player(&self) -> Option<&str> {
        self.winning_colour.map(|c| self.player(c))
    }

    /// Identifier of the loser, if there is one.
    pub fn losing_player(&self) -> Option<&str> {
        self.losing_colour().map(|c| self.player(c))
    }

    /// Score string in SGF `RE` style, eg `B+3`, `W+R`, `0`, `?`.
    pub fn score(&self) -> &str {
        &self.score
    }

    /// True if the game ended by forfeit.
    pub fn is_forfeit(&self) -> bool {
        self.is_forfeit
    }

    /// True for a drawn game.
    pub fn is_jigo(&self) -> bool {
        self.is_jigo
    }

    /// Extra information about the result.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// CPU seconds used by each player, where the engine reported it.
    pub fn cpu_times(&self) -> &BTreeMap<String, Option<f64>> {
        &self.cpu_times
    }

    /// One-line description, eg `one beat two B+3`, `one vs two jigo` or
    /// `one vs two ? (players disagreed)`.
    pub fn describe(&self) -> String {
        let mut s = match (self.winning_player(), self.losing_player()) {
            (Some(winner), Some(loser)) => format!("{winner} beat {loser} {}", self.score),
            _ if self.is_jigo => format!("{} vs {} jigo", self.player_b, self.player_w),
            // unresolved, including void games
            _ => format!("{} vs {} ?", self.player_b, self.player_w),
        };
        if let Some(detail) = &self.detail {
            s.push_str(&format!(" ({detail})"));
        }
        s
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
