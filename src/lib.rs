//! # GTP Referee
//!
//! A Rust crate for refereeing games of Go between two engines that speak the Go Text
//! Protocol (GTP).
//!
//! It provides:
//! - A line transport to engines, either subprocesses or in-process engines ([`channel`])
//! - A GTP controller that frames commands, classifies responses and shuts down safely
//!   ([`controller`])
//! - A board model checking every move for captures, suicide and simple ko ([`board`])
//! - A game state machine turning whatever the engines do into one result ([`game`])
//! - Serializable results ([`result`])
//!
//! The referee never trusts an engine's view of legality. Every move is checked against its
//! own board before being relayed to the opponent. Protocol failures, ill-formed moves and
//! illegal moves all end the game as a forfeit, so [`Game::run`](crate::game::Game::run)
//! always produces a result.
//!
//! # Documentation Overview
//!
//! - For the protocol layer and its error taxonomy, see [`Controller`](crate::controller::Controller)
//!   and [`ChannelError`](crate::channel::ChannelError).
//! - For running a game and the rules for forfeits and scoring, see [`Game`](crate::game::Game).
//! - For settings read from the environment, see
//!   [`Configuration`](crate::configuration::Configuration).
//! - For scripted engines in tests, see [`GtpEngine`](crate::engine::GtpEngine).
//!
//! # Usage Example
//!
//! Refereeing a game between two engine processes:
//!
//! ```no_run
//! use gtp_referee::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let factory = SubprocessFactory::new();
//!     let gnugo_args = ["--mode".to_string(), "gtp".to_string()];
//!     let mut black = Controller::new(factory.open("gnugo", &gnugo_args)?, "player gnugo");
//!     let mut white = Controller::new(factory.open("./my-engine", &[])?, "player mine");
//!
//!     // Engines are expected to be set up (boardsize, komi, clear_board) beforehand
//!     let config = Configuration::from_env();
//!     let mut game = Game::from_configuration(&config);
//!     game.set_player_code(Colour::Black, "gnugo");
//!     game.set_player_code(Colour::White, "mine");
//!     game.set_player_controller(Colour::Black, &mut black);
//!     game.set_player_controller(Colour::White, &mut white);
//!     game.ready()?;
//!     let result = game.run()?.clone();
//!     game.close_players();
//!
//!     if let Some(scoring) = game.describe_scoring() {
//!         println!("{scoring}");
//!     }
//!     if let Some(errors) = game.describe_late_errors() {
//!         eprintln!("{errors}");
//!     }
//!     println!("{}", result.score());
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]

pub use anyhow;
pub mod board;
pub mod channel;
pub mod configuration;
pub mod controller;
pub mod engine;
pub mod game;
mod logger;
pub mod result;
pub mod scoring;
pub mod vertex;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use gtp_referee::prelude::*;
/// ```
///
/// Includes:
/// - [`Configuration`](crate::configuration::Configuration)
/// - [`Game`](crate::game::Game) and [`GameResult`](crate::result::GameResult)
/// - [`Controller`](crate::controller::Controller) and the channel types
/// - [`GtpEngine`](crate::engine::GtpEngine)
pub mod prelude {
    pub use crate::board::{Board, Colour, Point};
    pub use crate::channel::{
        Channel, ChannelError, ChannelFactory, InternalChannel, SubprocessChannel,
        SubprocessFactory,
    };
    pub use crate::configuration::Configuration;
    pub use crate::controller::{BadGtpResponse, Controller, ControllerError, GtpCommand};
    pub use crate::engine::{GtpEngine, HandlerResult};
    pub use crate::game::{Game, GameState, GameStateError, MoveRecord};
    pub use crate::result::{GameResult, Outcome};
}
