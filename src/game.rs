//! Running a single game between two GTP engines.
//!
//! A [`Game`] drives two [`Controller`]s through a game, checking every move
//! against its own [`Board`] before relaying it to the other engine. Whatever
//! the engines do, [`Game::run`] ends with a [`GameResult`]: protocol
//! failures and illegal moves become forfeits.
//!
//! The game borrows the controllers and never starts or stops engine
//! processes. Once the game is over, [`Game::close_players`] shuts both
//! controllers down; failures during shutdown are available from
//! [`Game::describe_late_errors`] and never returned as errors.
//!
//! # Example
//!
//! ```
//! use gtp_referee::prelude::*;
//!
//! fn passer() -> GtpEngine {
//!     GtpEngine::new()
//!         .with_command("genmove", |_| Ok("pass".to_string()))
//!         .with_command("play", |_| Ok(String::new()))
//! }
//!
//! let mut black = Controller::new(InternalChannel::new(passer()), "player one");
//! let mut white = Controller::new(InternalChannel::new(passer()), "player two");
//!
//! let mut game = Game::new(9, 0.0);
//! game.set_player_code(Colour::Black, "one");
//! game.set_player_code(Colour::White, "two");
//! game.set_player_controller(Colour::Black, &mut black);
//! game.set_player_controller(Colour::White, &mut white);
//! game.use_internal_scorer();
//! game.ready().unwrap();
//! let result = game.run().unwrap().clone();
//! game.close_players();
//!
//! assert_eq!(result.describe(), "one vs two jigo");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::board::{Board, Colour, Point};
use crate::channel::Channel;
use crate::configuration::{check_board_size, Configuration};
use crate::controller::{
    Controller, ControllerError, GtpCommand, CPU_TIME, EXPLAIN_LAST_MOVE, GENMOVE_EX,
};
use crate::logger::init_logger;
use crate::result::{GameResult, Outcome};
use crate::scoring::{internal_outcome, resolve_reports};
use crate::vertex::parse_vertex;

/// Lifecycle of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Being set up.
    NotReady,
    /// Checked by [`Game::ready`], waiting for [`Game::run`].
    Ready,
    /// Moves are being played.
    InProgress,
    /// The result is known.
    Ended,
}

/// Misuse of a [`Game`]. These are programming errors, not engine failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameStateError {
    /// An operation was called in the wrong state.
    #[error("{operation}() called when game is {state:?}")]
    WrongState {
        /// The operation attempted.
        operation: &'static str,
        /// The state the game was in.
        state: GameState,
    },
    /// No controller was set for a colour.
    #[error("no controller set for {0}")]
    MissingController(Colour),
    /// No player identifier was set for a colour.
    #[error("no player code set for {0}")]
    MissingPlayer(Colour),
    /// The board size cannot be played.
    #[error("unsupported board size {0}")]
    BadBoardSize(usize),
    /// Komi is not a finite number.
    #[error("invalid komi {0}")]
    BadKomi(f64),
}

/// One move of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Who moved.
    pub colour: Colour,
    /// Where, `None` for a pass.
    pub point: Option<Point>,
    /// The engine's explanation of the move, if it gave one.
    pub comment: Option<String>,
}

/// A game between two engines.
pub struct Game<'a, C: Channel> {
    board: Board,
    komi: f64,
    move_limit: usize,
    state: GameState,
    moves: Vec<MoveRecord>,
    controllers: [Option<&'a mut Controller<C>>; 2],
    players: [Option<String>; 2],
    allowed_scorers: [bool; 2],
    claim_allowed: [bool; 2],
    internal_scorer: bool,
    final_scores: [Option<String>; 2],
    players_disagreed: bool,
    result: Option<GameResult>,
}

impl<C: Channel> fmt::Debug for Game<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("players", &self.players)
            .field("komi", &self.komi)
            .field("moves", &self.moves.len())
            .field("result", &self.result)
            .finish()
    }
}

impl<'a, C: Channel> Game<'a, C> {
    /// Create a game on an empty board.
    ///
    /// Nobody is asked for the final score until [`Game::allow_scorer`] or
    /// [`Game::use_internal_scorer`] is called.
    pub fn new(board_size: usize, komi: f64) -> Self {
        Game {
            board: Board::new(board_size),
            komi,
            move_limit: 1000,
            state: GameState::NotReady,
            moves: vec![],
            controllers: [None, None],
            players: [None, None],
            allowed_scorers: [false, false],
            claim_allowed: [false, false],
            internal_scorer: false,
            final_scores: [None, None],
            players_disagreed: false,
            result: None,
        }
    }

    /// Create a game from a [`Configuration`], starting file logging if it asks for it.
    pub fn from_configuration(config: &Configuration) -> Self {
        if config.log {
            if let Err(e) = init_logger() {
                warn!("{e:#}");
            }
        }
        let mut game = Self::new(config.board_size, config.komi);
        game.move_limit = config.move_limit;
        game.internal_scorer = config.internal_scorer;
        game.allowed_scorers = config.scorers;
        game.claim_allowed = config.claims;
        game
    }

    /// Set the identifier reported in the result for `colour`.
    pub fn set_player_code(&mut self, colour: Colour, code: impl Into<String>) {
        self.players[colour.index()] = Some(code.into());
    }

    /// Set the controller for the engine playing `colour`.
    pub fn set_player_controller(&mut self, colour: Colour, controller: &'a mut Controller<C>) {
        self.controllers[colour.index()] = Some(controller);
    }

    /// Ask the engine playing `colour` for the final score.
    pub fn allow_scorer(&mut self, colour: Colour) {
        self.allowed_scorers[colour.index()] = true;
    }

    /// Let the engine playing `colour` claim a win.
    pub fn set_claim_allowed(&mut self, colour: Colour) {
        self.claim_allowed[colour.index()] = true;
    }

    /// Score the final position by area rather than asking the engines.
    pub fn use_internal_scorer(&mut self) {
        self.internal_scorer = true;
    }

    /// Set the number of moves after which the game is declared void.
    pub fn set_move_limit(&mut self, limit: usize) {
        self.move_limit = limit;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Identifier of the player of `colour`, if set.
    pub fn player_code(&self, colour: Colour) -> Option<&str> {
        self.players[colour.index()].as_deref()
    }

    /// Controller of the player of `colour`, if set.
    pub fn get_controller(&self, colour: Colour) -> Option<&Controller<C>> {
        self.controllers[colour.index()].as_deref()
    }

    /// The referee's board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Moves played so far.
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// The result, once the game has ended.
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Check that the game can be run.
    ///
    /// # Errors
    /// A [`GameStateError`] if called twice or if a setting is missing or invalid.
    pub fn ready(&mut self) -> Result<(), GameStateError> {
        if self.state != GameState::NotReady {
            return Err(GameStateError::WrongState {
                operation: "ready",
                state: self.state,
            });
        }
        if !check_board_size(self.board.size()) {
            return Err(GameStateError::BadBoardSize(self.board.size()));
        }
        if !self.komi.is_finite() {
            return Err(GameStateError::BadKomi(self.komi));
        }
        for colour in Colour::ALL {
            if self.controllers[colour.index()].is_none() {
                return Err(GameStateError::MissingController(colour));
            }
            if self.players[colour.index()].is_none() {
                return Err(GameStateError::MissingPlayer(colour));
            }
        }
        self.state = GameState::Ready;
        Ok(())
    }

    /// Play the game to the end.
    ///
    /// Engine failures never make this fail; they are part of the result.
    ///
    /// # Errors
    /// A [`GameStateError`] unless the game is [`GameState::Ready`].
    #[instrument(skip_all)]
    pub fn run(&mut self) -> Result<&GameResult, GameStateError> {
        if self.state != GameState::Ready {
            return Err(GameStateError::WrongState {
                operation: "run",
                state: self.state,
            });
        }
        self.state = GameState::InProgress;
        let outcome = self.play_moves()?;
        let cpu_times = self.collect_cpu_times()?;
        let result = GameResult::new(
            self.player(Colour::Black)?,
            self.player(Colour::White)?,
            outcome,
            cpu_times,
        );
        info!(moves = self.moves.len(), "{}", result.describe());
        self.state = GameState::Ended;
        Ok(&*self.result.insert(result))
    }

    fn player(&self, colour: Colour) -> Result<String, GameStateError> {
        self.players[colour.index()]
            .clone()
            .ok_or(GameStateError::MissingPlayer(colour))
    }

    fn controller(&mut self, colour: Colour) -> Result<&mut Controller<C>, GameStateError> {
        self.controllers[colour.index()]
            .as_deref_mut()
            .ok_or(GameStateError::MissingController(colour))
    }

    fn play_moves(&mut self) -> Result<Outcome, GameStateError> {
        let mut colour = Colour::Black;
        let mut previous_was_pass = false;
        let mut moves_made = [0usize; 2];
        loop {
            if self.moves.len() >= self.move_limit {
                return Ok(Outcome::void("hit move limit"));
            }
            let opponent = colour.opponent();
            let player = self.player(colour)?;
            let claim_eligible =
                self.claim_allowed[colour.index()] && moves_made[colour.index()] > 0;

            let (response, claim_used) =
                match request_move(self.controller(colour)?, colour, claim_eligible) {
                    Ok(r) => r,
                    Err(e) => return Ok(forfeit(opponent, format!("forfeit: {e}"))),
                };
            let move_s = response.trim().to_ascii_lowercase();
            debug!(%colour, %move_s);
            if claim_used && move_s == "claim" {
                return Ok(Outcome::claim(colour));
            }
            if move_s == "resign" {
                return Ok(Outcome::resignation(opponent));
            }

            let point = match parse_vertex(&move_s, self.board.size()) {
                Ok(point) => point,
                Err(_) => {
                    return Ok(forfeit(
                        opponent,
                        format!("forfeit: {player} attempted ill-formed move {move_s}"),
                    ));
                }
            };
            match point {
                Some(p) => {
                    let checked = self.board.check_move(colour, p);
                    if let Err(reason) = checked.and_then(|()| self.board.play(colour, p)) {
                        return Ok(forfeit(
                            opponent,
                            format!("forfeit: {player} attempted move to {reason} {move_s}"),
                        ));
                    }
                }
                None => self.board.pass(),
            }

            let other = self.controller(opponent)?;
            match other.do_command(GtpCommand::Play(colour, &move_s)) {
                Ok(_) => {}
                Err(ControllerError::BadResponse(e)) if is_illegality_complaint(&e.message) => {
                    let other_player = self.player(opponent)?;
                    return Ok(forfeit(
                        opponent,
                        format!("forfeit: {other_player} claims move {move_s} is illegal"),
                    ));
                }
                Err(e) => {
                    return Ok(forfeit(colour, format!("forfeit: {e}")));
                }
            }

            let (comment, failure) = match explain_last_move(self.controller(colour)?) {
                Ok(comment) => (comment, None),
                Err(e) => (None, Some(e)),
            };
            self.moves.push(MoveRecord {
                colour,
                point,
                comment,
            });
            moves_made[colour.index()] += 1;
            if let Some(e) = failure {
                return Ok(forfeit(opponent, format!("forfeit: {e}")));
            }

            if point.is_none() && previous_was_pass {
                return self.score_game();
            }
            previous_was_pass = point.is_none();
            colour = opponent;
        }
    }

    fn score_game(&mut self) -> Result<Outcome, GameStateError> {
        if self.internal_scorer {
            return Ok(internal_outcome(self.board.area_score(), self.komi));
        }
        for colour in Colour::ALL {
            if !self.allowed_scorers[colour.index()] {
                continue;
            }
            let controller = self.controller(colour)?;
            let report = match controller.known_command("final_score") {
                Ok(true) => controller.do_command(GtpCommand::FinalScore),
                Ok(false) => continue,
                Err(e) => Err(e),
            };
            let report = match report {
                Ok(score) => Some(score),
                Err(e) => {
                    warn!("no score from {colour}: {e}");
                    None
                }
            };
            self.final_scores[colour.index()] = report;
        }
        let resolution = resolve_reports(
            self.final_scores[0].as_deref(),
            self.final_scores[1].as_deref(),
        );
        self.players_disagreed = resolution.disagreed;
        Ok(resolution.outcome)
    }

    fn collect_cpu_times(&mut self) -> Result<BTreeMap<String, Option<f64>>, GameStateError> {
        let mut cpu_times = BTreeMap::new();
        for colour in Colour::ALL {
            let player = self.player(colour)?;
            let controller = self.controller(colour)?;
            let time = match controller.known_command(CPU_TIME) {
                Ok(true) => controller
                    .do_command(GtpCommand::CpuTime)
                    .ok()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .filter(|t| t.is_finite() && *t >= 0.0),
                _ => None,
            };
            cpu_times.insert(player, time);
        }
        Ok(cpu_times)
    }

    /// The result's description, followed by the players' score reports when they disagreed.
    pub fn describe_scoring(&self) -> Option<String> {
        let result = self.result.as_ref()?;
        let mut s = result.describe();
        if self.players_disagreed {
            for colour in Colour::ALL {
                if let Some(report) = &self.final_scores[colour.index()] {
                    s.push_str(&format!(
                        "\n{} final_score: {report}",
                        result.player(colour)
                    ));
                }
            }
        }
        Some(s)
    }

    /// Shut down both engines.
    ///
    /// Both controllers are always closed, however the other one fared. Never fails.
    pub fn close_players(&mut self) {
        for controller in self.controllers.iter_mut().flatten() {
            controller.safe_close();
        }
    }

    /// Everything that went wrong while closing the players, or `None`.
    pub fn describe_late_errors(&self) -> Option<String> {
        let errors: Vec<&str> = self
            .controllers
            .iter()
            .flatten()
            .flat_map(|c| c.retrieve_error_messages())
            .map(String::as_str)
            .collect();
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("\n"))
        }
    }
}

fn forfeit(winner: Colour, detail: String) -> Outcome {
    warn!(%winner, "{detail}");
    Outcome::forfeit(winner, detail)
}

/// Ask for a move, offering a claim when allowed and supported.
///
/// Returns the response and whether claiming was offered.
fn request_move<C: Channel>(
    controller: &mut Controller<C>,
    colour: Colour,
    claim_eligible: bool,
) -> Result<(String, bool), ControllerError> {
    if claim_eligible && controller.known_command(GENMOVE_EX)? {
        let response = controller.do_command(GtpCommand::GenmoveClaim(colour))?;
        return Ok((response, true));
    }
    let response = controller.do_command(GtpCommand::Genmove(colour))?;
    Ok((response, false))
}

/// The engine's comment on the move it just played, if it gives one.
///
/// A failure response only means there is no comment; a channel failure is
/// returned.
fn explain_last_move<C: Channel>(
    controller: &mut Controller<C>,
) -> Result<Option<String>, ControllerError> {
    if !controller.known_command(EXPLAIN_LAST_MOVE)? {
        return Ok(None);
    }
    match controller.do_command(GtpCommand::ExplainLastMove) {
        Ok(comment) if comment.is_empty() => Ok(None),
        Ok(comment) => Ok(Some(comment)),
        Err(ControllerError::BadResponse(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_illegality_complaint(message: &str) -> bool {
    message.trim().to_ascii_lowercase().starts_with("illegal move")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::InternalChannel;
    use crate::engine::GtpEngine;

    fn passer() -> Controller<InternalChannel> {
        let engine = GtpEngine::new()
            .with_command("genmove", |_| Ok("pass".to_string()))
            .with_command("play", |_| Ok(String::new()));
        Controller::new(InternalChannel::new(engine), "passer")
    }

    #[test]
    fn test_run_before_ready() {
        let mut game: Game<InternalChannel> = Game::new(9, 0.0);
        assert_eq!(
            game.run().unwrap_err(),
            GameStateError::WrongState {
                operation: "run",
                state: GameState::NotReady
            }
        );
    }

    #[test]
    fn test_ready_requires_players() {
        let mut b = passer();
        let mut game = Game::new(9, 0.0);
        game.set_player_controller(Colour::Black, &mut b);
        game.set_player_code(Colour::Black, "one");
        assert_eq!(
            game.ready().unwrap_err(),
            GameStateError::MissingController(Colour::White)
        );
    }

    #[test]
    fn test_ready_checks_settings() {
        let mut game: Game<InternalChannel> = Game::new(30, 0.0);
        assert_eq!(game.ready().unwrap_err(), GameStateError::BadBoardSize(30));
        let mut game: Game<InternalChannel> = Game::new(9, f64::NAN);
        assert!(matches!(game.ready(), Err(GameStateError::BadKomi(_))));
    }

    #[test]
    fn test_state_transitions() {
        let (mut b, mut w) = (passer(), passer());
        let mut game = Game::new(9, 0.0);
        game.set_player_code(Colour::Black, "one");
        game.set_player_code(Colour::White, "two");
        game.set_player_controller(Colour::Black, &mut b);
        game.set_player_controller(Colour::White, &mut w);
        game.use_internal_scorer();
        assert_eq!(game.state(), GameState::NotReady);
        game.ready().unwrap();
        assert_eq!(game.state(), GameState::Ready);
        assert!(game.ready().is_err());
        assert!(game.result().is_none());
        let result = game.run().unwrap().clone();
        assert_eq!(game.state(), GameState::Ended);
        assert!(game.run().is_err());
        assert!(game.ready().is_err());
        assert_eq!(game.result(), Some(&result));
        assert_eq!(result.score(), "0");
        assert!(result.is_jigo());
        game.close_players();
        assert!(game.describe_late_errors().is_none());
    }

    #[test]
    fn test_move_limit() {
        let (mut b, mut w) = (passer(), passer());
        let mut game = Game::new(9, 0.0);
        game.set_player_code(Colour::Black, "one");
        game.set_player_code(Colour::White, "two");
        game.set_player_controller(Colour::Black, &mut b);
        game.set_player_controller(Colour::White, &mut w);
        game.set_move_limit(1);
        game.ready().unwrap();
        let result = game.run().unwrap();
        assert_eq!(result.score(), "Void");
        assert_eq!(result.describe(), "one vs two ? (hit move limit)");
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn test_illegality_complaint() {
        assert!(is_illegality_complaint("illegal move"));
        assert!(is_illegality_complaint("Illegal move: ko"));
        assert!(!is_illegality_complaint("crash"));
    }
}
