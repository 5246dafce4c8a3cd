//! GTP controller: command framing, response classification, shutdown.
//!
//! A [`Controller`] owns one [`Channel`] and drives it one exchange at a
//! time. It turns lines into GTP responses and failures into a small error
//! taxonomy:
//!
//! - [`ChannelError`] (transport, protocol framing, closed channel), wrapped
//!   with the command and player it happened on
//! - [`BadGtpResponse`] when the engine answers with a `?` failure response
//!
//! During play these are returned to the caller. During shutdown
//! ([`Controller::safe_close`]) they are recorded and never returned.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::board::Colour;
use crate::channel::{Channel, ChannelError};

/// Claim-capable genmove extension command.
pub const GENMOVE_EX: &str = "gomill-genmove_ex";

/// CPU time query extension command.
pub const CPU_TIME: &str = "gomill-cpu_time";

/// Move commentary extension command.
pub const EXPLAIN_LAST_MOVE: &str = "gomill-explain_last_move";

/// The engine answered a command with a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failure response from '{command}' to {player}:\n{message}")]
pub struct BadGtpResponse {
    /// The command line, without newline.
    pub command: String,
    /// Controller name of the engine.
    pub player: String,
    /// Text of the failure response.
    pub message: String,
}

/// Failure of a command exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The channel failed while sending the command or reading its response.
    #[error("{context}:\n{source}")]
    Channel {
        /// What was being done, eg "transport error sending 'genmove b' to player one".
        context: String,
        /// The underlying channel failure.
        source: ChannelError,
    },
    /// The engine returned a failure response.
    #[error(transparent)]
    BadResponse(#[from] BadGtpResponse),
}

/// A classified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtpResponse {
    /// True for a `?` response.
    pub is_failure: bool,
    /// Response text, lines joined with `\n`.
    pub text: String,
}

/// Commands the referee issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtpCommand<'a> {
    /// `genmove <colour>`
    Genmove(Colour),
    /// `gomill-genmove_ex <colour> claim`
    GenmoveClaim(Colour),
    /// `play <colour> <vertex>`
    Play(Colour, &'a str),
    /// `final_score`
    FinalScore,
    /// `known_command <name>`
    KnownCommand(&'a str),
    /// `gomill-cpu_time`
    CpuTime,
    /// `gomill-explain_last_move`
    ExplainLastMove,
    /// `quit`
    Quit,
}

impl<'a> GtpCommand<'a> {
    /// Command name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            GtpCommand::Genmove(_) => "genmove",
            GtpCommand::GenmoveClaim(_) => GENMOVE_EX,
            GtpCommand::Play(..) => "play",
            GtpCommand::FinalScore => "final_score",
            GtpCommand::KnownCommand(_) => "known_command",
            GtpCommand::CpuTime => CPU_TIME,
            GtpCommand::ExplainLastMove => EXPLAIN_LAST_MOVE,
            GtpCommand::Quit => "quit",
        }
    }

    /// Arguments as sent on the wire.
    pub fn args(&self) -> Vec<&'a str> {
        match *self {
            GtpCommand::Genmove(colour) => vec![colour.as_str()],
            GtpCommand::GenmoveClaim(colour) => vec![colour.as_str(), "claim"],
            GtpCommand::Play(colour, vertex) => vec![colour.as_str(), vertex],
            GtpCommand::KnownCommand(name) => vec![name],
            GtpCommand::FinalScore
            | GtpCommand::CpuTime
            | GtpCommand::ExplainLastMove
            | GtpCommand::Quit => vec![],
        }
    }
}

impl fmt::Display for GtpCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&command_line(self.name(), &self.args()))
    }
}

fn command_line(name: &str, args: &[&str]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{name} {}", args.join(" "))
    }
}

/// Protocol endpoint for one engine.
#[derive(Debug)]
pub struct Controller<C: Channel> {
    name: String,
    channel: C,
    channel_is_closed: bool,
    channel_is_bad: bool,
    known_commands: HashMap<String, bool>,
    late_errors: Vec<String>,
}

impl<C: Channel> Controller<C> {
    /// Controller for the engine on `channel`; `name` is used in error messages.
    pub fn new(channel: C, name: impl Into<String>) -> Self {
        Controller {
            name: name.into(),
            channel,
            channel_is_closed: false,
            channel_is_bad: false,
            known_commands: HashMap::new(),
            late_errors: vec![],
        }
    }

    /// Name used in error messages, eg "player one".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// True once the controller has closed its channel.
    pub fn is_closed(&self) -> bool {
        self.channel_is_closed
    }

    /// Send a command and return the success response text.
    ///
    /// # Errors
    /// [`ControllerError::BadResponse`] for a failure response,
    /// [`ControllerError::Channel`] if the exchange itself failed.
    pub fn send_command(&mut self, name: &str, args: &[&str]) -> Result<String, ControllerError> {
        let response = self.send_command_status(name, args)?;
        if response.is_failure {
            return Err(BadGtpResponse {
                command: command_line(name, args),
                player: self.name.clone(),
                message: response.text,
            }
            .into());
        }
        Ok(response.text)
    }

    /// Send one of the referee's commands.
    pub fn do_command(&mut self, command: GtpCommand) -> Result<String, ControllerError> {
        self.send_command(command.name(), &command.args())
    }

    /// Send a command and return the response, whether success or failure.
    ///
    /// Only channel failures are errors.
    #[instrument(skip(self), fields(player = %self.name))]
    pub fn send_command_status(
        &mut self,
        name: &str,
        args: &[&str],
    ) -> Result<GtpResponse, ControllerError> {
        let line = command_line(name, args);
        if self.channel_is_closed || self.channel_is_bad {
            let message = if self.channel_is_closed {
                "channel is closed"
            } else {
                "channel is broken after a previous error"
            };
            return Err(ControllerError::Channel {
                context: format!("error sending '{line}' to {}", self.name),
                source: ChannelError::Closed(message.to_string()),
            });
        }

        trace!(%line, "sending");
        if let Err(source) = self.channel.send_command_line(&format!("{line}\n")) {
            self.channel_is_bad = true;
            return Err(ControllerError::Channel {
                context: format!("{} sending '{line}' to {}", source.kind(), self.name),
                source,
            });
        }

        match self.read_response() {
            Ok(response) => {
                debug!(?response, "received");
                Ok(response)
            }
            Err(source) => {
                self.channel_is_bad = true;
                Err(ControllerError::Channel {
                    context: format!(
                        "{} reading response to '{line}' from {}",
                        source.kind(),
                        self.name
                    ),
                    source,
                })
            }
        }
    }

    fn read_response(&mut self) -> Result<GtpResponse, ChannelError> {
        let mut lines: Vec<String> = vec![];
        loop {
            let raw = self.channel.get_response_line()?;
            if raw.is_empty() {
                return Err(if lines.is_empty() {
                    ChannelError::Closed("engine has closed the response channel".to_string())
                } else {
                    ChannelError::Protocol("engine closed the response channel mid-response".to_string())
                });
            }
            let line = raw.replace('\r', "");
            let line = line.trim_end_matches('\n');
            if lines.is_empty() && line.trim().is_empty() {
                continue;
            }
            if line.is_empty() {
                break;
            }
            lines.push(line.to_string());
        }

        let first = &lines[0];
        let is_failure = match first.chars().next() {
            Some('=') => false,
            Some('?') => true,
            _ => {
                return Err(ChannelError::Protocol(format!(
                    "no success/failure indication from engine: first line is `{first}`"
                )))
            }
        };
        // skip an echoed command id, if any
        let first_text = first[1..]
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim();
        let text = std::iter::once(first_text)
            .chain(lines[1..].iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(GtpResponse { is_failure, text })
    }

    /// True if the engine supports `command`.
    ///
    /// Only the first call for a given name talks to the engine; the answer is
    /// cached for the controller's lifetime. A failure response counts as
    /// "not known".
    pub fn known_command(&mut self, command: &str) -> Result<bool, ControllerError> {
        if let Some(&known) = self.known_commands.get(command) {
            return Ok(known);
        }
        let known = match self.do_command(GtpCommand::KnownCommand(command)) {
            Ok(response) => response.trim().eq_ignore_ascii_case("true"),
            Err(ControllerError::BadResponse(_)) => false,
            Err(e) => return Err(e),
        };
        self.known_commands.insert(command.to_string(), known);
        Ok(known)
    }

    /// Send `quit` and close the channel, never failing.
    ///
    /// Channel failures are recorded for [`Controller::retrieve_error_messages`].
    /// Does nothing if the channel is already closed.
    #[instrument(skip(self), fields(player = %self.name))]
    pub fn safe_close(&mut self) {
        if self.channel_is_closed {
            return;
        }
        if !self.channel_is_bad {
            match self.do_command(GtpCommand::Quit) {
                Ok(_) => {}
                Err(ControllerError::BadResponse(e)) => debug!("ignoring: {e}"),
                Err(e) => self.late_errors.push(e.to_string()),
            }
        }
        if let Err(e) = self.channel.close() {
            self.late_errors
                .push(format!("error closing {}:\n{e}", self.name));
        }
        self.channel_is_closed = true;
        for e in &self.late_errors {
            warn!("{e}");
        }
    }

    /// Failures recorded during shutdown.
    pub fn retrieve_error_messages(&self) -> &[String] {
        &self.late_errors
    }
}
