#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gtp_referee::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const BOARD_SIZE: usize = 9;

pub fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn colour_arg(args: &[&str]) -> Result<Colour, String> {
    args.first()
        .and_then(|s| Colour::from_name(s))
        .ok_or_else(|| "invalid colour".to_string())
}

/// Black fills column E and white column G, one row per move, then both pass.
#[derive(Debug, Default)]
pub struct TestPlayer {
    pub row_to_play: usize,
}

impl TestPlayer {
    pub fn genmove(&mut self, args: &[&str]) -> HandlerResult {
        let column = match colour_arg(args)? {
            Colour::Black => 'E',
            Colour::White => 'G',
        };
        if self.row_to_play < BOARD_SIZE {
            self.row_to_play += 1;
            Ok(format!("{column}{}", self.row_to_play))
        } else {
            Ok("pass".to_string())
        }
    }
}

pub fn test_player_engine(player: Rc<RefCell<TestPlayer>>) -> GtpEngine {
    GtpEngine::new()
        .with_command("genmove", move |args| player.borrow_mut().genmove(args))
        .with_command("play", |_| Ok(String::new()))
}

pub fn test_player() -> GtpEngine {
    test_player_engine(Rc::new(RefCell::new(TestPlayer::default())))
}

/// Plays its colour's moves from a fixed list, then passes.
///
/// A move of `fail` gives a failure response. `reject` makes `play` fail with
/// the given message for one vertex.
#[derive(Debug)]
pub struct ProgrammedPlayer {
    queues: [VecDeque<String>; 2],
    reject: Option<(String, String)>,
}

impl ProgrammedPlayer {
    pub fn new(moves: &[(Colour, &str)], reject: Option<(&str, &str)>) -> Self {
        let mut queues = [VecDeque::new(), VecDeque::new()];
        for &(colour, vertex) in moves {
            let queue = match colour {
                Colour::Black => &mut queues[0],
                Colour::White => &mut queues[1],
            };
            queue.push_back(vertex.to_string());
        }
        ProgrammedPlayer {
            queues,
            reject: reject.map(|(v, m)| (v.to_string(), m.to_string())),
        }
    }

    pub fn genmove(&mut self, args: &[&str]) -> HandlerResult {
        let queue = match colour_arg(args)? {
            Colour::Black => &mut self.queues[0],
            Colour::White => &mut self.queues[1],
        };
        match queue.pop_front() {
            Some(m) if m == "fail" => Err("forced to fail".to_string()),
            Some(m) => Ok(m),
            None => Ok("pass".to_string()),
        }
    }

    pub fn play(&mut self, args: &[&str]) -> HandlerResult {
        if let (Some((vertex, message)), Some(played)) = (&self.reject, args.get(1)) {
            if vertex.eq_ignore_ascii_case(played) {
                return Err(message.clone());
            }
        }
        Ok(String::new())
    }

    pub fn into_engine(self) -> GtpEngine {
        let player = Rc::new(RefCell::new(self));
        let for_play = Rc::clone(&player);
        GtpEngine::new()
            .with_command("genmove", move |args| player.borrow_mut().genmove(args))
            .with_command("play", move |args| for_play.borrow_mut().play(args))
    }
}

pub fn programmed_player(moves: &[(Colour, &str)]) -> GtpEngine {
    ProgrammedPlayer::new(moves, None).into_engine()
}

/// Channel to an in-process engine that can be made to fail.
#[derive(Debug)]
pub struct FaultyChannel {
    inner: InternalChannel,
    pub fail_close: bool,
    /// Break the transport after this many commands have been sent.
    pub break_after: Option<usize>,
    pub commands_sent: Vec<String>,
}

impl FaultyChannel {
    pub fn new(engine: GtpEngine) -> Self {
        FaultyChannel {
            inner: InternalChannel::new(engine),
            fail_close: false,
            break_after: None,
            commands_sent: vec![],
        }
    }
}

impl Channel for FaultyChannel {
    fn send_command_line(&mut self, line: &str) -> Result<(), ChannelError> {
        if self.break_after == Some(self.commands_sent.len()) {
            return Err(ChannelError::Transport("forced failure for send_command_line".to_string()));
        }
        self.commands_sent.push(line.trim_end().to_string());
        self.inner.send_command_line(line)
    }

    fn get_response_line(&mut self) -> Result<String, ChannelError> {
        self.inner.get_response_line()
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.inner.close()?;
        if self.fail_close {
            return Err(ChannelError::Transport("forced failure for close".to_string()));
        }
        Ok(())
    }
}

pub fn controllers(
    engine_b: GtpEngine,
    engine_w: GtpEngine,
) -> (Controller<InternalChannel>, Controller<InternalChannel>) {
    (
        Controller::new(InternalChannel::new(engine_b), "player one"),
        Controller::new(InternalChannel::new(engine_w), "player two"),
    )
}

/// A 9x9 game between players "one" (black) and "two" (white).
pub fn new_game<'a, C: Channel>(
    controller_b: &'a mut Controller<C>,
    controller_w: &'a mut Controller<C>,
    komi: f64,
) -> Game<'a, C> {
    let mut game = Game::new(BOARD_SIZE, komi);
    game.set_player_code(Colour::Black, "one");
    game.set_player_code(Colour::White, "two");
    game.set_player_controller(Colour::Black, controller_b);
    game.set_player_controller(Colour::White, controller_w);
    game
}

/// Moves as `(colour, vertex)`, eg `(Black, "E1")`.
pub fn game_moves<C: Channel>(game: &Game<C>) -> Vec<(Colour, String)> {
    game.moves()
        .iter()
        .map(|m| (m.colour, gtp_referee::vertex::format_vertex(m.point)))
        .collect()
}

pub fn expected_moves(moves: &[(Colour, &str)]) -> Vec<(Colour, String)> {
    moves.iter().map(|&(c, v)| (c, v.to_string())).collect()
}
