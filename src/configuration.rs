//! Game settings
//!
//! This module provides the settings that shape a refereed game: board, komi,
//! who may score or claim, and whether to log.
//!
//! A configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`], then applied with
//! [`Game::from_configuration`](crate::game::Game::from_configuration).
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive: set the value to `"true"` to enable one.
//!
//! - `GTP_REFEREE_LOG` — Enable logging to a file (default: `false`)
//! - `GTP_REFEREE_BOARD_SIZE` — Board size (default: `19`)
//! - `GTP_REFEREE_KOMI` — Komi (default: `7.5`)
//! - `GTP_REFEREE_MOVE_LIMIT` — Moves after which the game is void (default: `1000`)
//! - `GTP_REFEREE_INTERNAL_SCORER` — Score by area instead of asking the engines (default: `false`)
//! - `GTP_REFEREE_SCORERS` — Colours whose `final_score` is trusted, eg `"bw"`, `"w"` (default: `"bw"`)
//! - `GTP_REFEREE_CLAIMS` — Colours allowed to claim a win (default: `""`)

use std::str::FromStr;

use anyhow::{bail, Context};
use tracing::warn;

use crate::board::Colour;
use crate::vertex::MAX_BOARD_SIZE;

/// Settings for one game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    pub(crate) log: bool,
    pub(crate) board_size: usize,
    pub(crate) komi: f64,
    pub(crate) move_limit: usize,
    pub(crate) internal_scorer: bool,
    pub(crate) scorers: [bool; 2],
    pub(crate) claims: [bool; 2],
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Logging to file is disabled.
    /// - The board is 19x19 with komi 7.5.
    /// - The game is void after 1000 moves.
    /// - Both engines are asked for the final score.
    /// - Nobody may claim a win.
    pub fn new() -> Self {
        Self {
            log: false,
            board_size: 19,
            komi: 7.5,
            move_limit: 1000,
            internal_scorer: false,
            scorers: [true, true],
            claims: [false, false],
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset variables keep their default value. Variables that cannot be
    /// parsed are reported with a warning and also keep their default value.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_parsed<T: FromStr>(var: &str, default: T) -> T
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            let Ok(val) = std::env::var(var) else {
                return default;
            };
            match val
                .trim()
                .parse()
                .with_context(|| format!("invalid value '{val}' for {var}"))
            {
                Ok(v) => v,
                Err(e) => {
                    warn!("{e:#}");
                    default
                }
            }
        }

        fn get_env_colours(var: &str, default: [bool; 2]) -> [bool; 2] {
            let Ok(val) = std::env::var(var) else {
                return default;
            };
            match parse_colours(&val).with_context(|| format!("invalid value '{val}' for {var}")) {
                Ok(v) => v,
                Err(e) => {
                    warn!("{e:#}");
                    default
                }
            }
        }

        let default = Self::new();
        Self {
            log: get_env_flag("GTP_REFEREE_LOG", default.log),
            board_size: get_env_parsed("GTP_REFEREE_BOARD_SIZE", default.board_size),
            komi: get_env_parsed("GTP_REFEREE_KOMI", default.komi),
            move_limit: get_env_parsed("GTP_REFEREE_MOVE_LIMIT", default.move_limit),
            internal_scorer: get_env_flag("GTP_REFEREE_INTERNAL_SCORER", default.internal_scorer),
            scorers: get_env_colours("GTP_REFEREE_SCORERS", default.scorers),
            claims: get_env_colours("GTP_REFEREE_CLAIMS", default.claims),
        }
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Set the board size (up to 25).
    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = size;
        self
    }

    /// Set komi.
    pub fn with_komi(mut self, komi: f64) -> Self {
        self.komi = komi;
        self
    }

    /// Set the number of moves after which the game is void.
    pub fn with_move_limit(mut self, limit: usize) -> Self {
        self.move_limit = limit;
        self
    }

    /// Score finished games from the board instead of asking the engines.
    pub fn with_internal_scorer(mut self, value: bool) -> Self {
        self.internal_scorer = value;
        self
    }

    /// Set whether the engine playing `colour` is asked for the final score.
    pub fn with_scorer(mut self, colour: Colour, value: bool) -> Self {
        self.scorers[colour.index()] = value;
        self
    }

    /// Set whether the engine playing `colour` may claim a win.
    pub fn with_claim_allowed(mut self, colour: Colour, value: bool) -> Self {
        self.claims[colour.index()] = value;
        self
    }

    /// Board size.
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Komi.
    pub fn komi(&self) -> f64 {
        self.komi
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a set of colours written as letters, eg `"bw"`, `"w"` or `""`.
fn parse_colours(s: &str) -> anyhow::Result<[bool; 2]> {
    let mut colours = [false, false];
    for c in s.trim().chars() {
        match Colour::from_name(&c.to_string()) {
            Some(colour) => colours[colour.index()] = true,
            None => bail!("'{c}' is not a colour"),
        }
    }
    if s.trim().chars().count() > 2 {
        bail!("too many colours");
    }
    Ok(colours)
}

/// True if vertex text can describe every point of a board of this size.
pub(crate) fn check_board_size(size: usize) -> bool {
    (1..=MAX_BOARD_SIZE).contains(&size)
}
