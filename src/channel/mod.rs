//! Raw line transport to a GTP engine.
//!
//! A [`Channel`] moves lines of text and nothing more: it does not look at
//! status characters or response terminators, that is the controller's job.
//!
//! Two implementations are provided:
//! - [`SubprocessChannel`] talks to an engine process over its stdin/stdout
//! - [`InternalChannel`] runs an in-process [`GtpEngine`](crate::engine::GtpEngine)

use thiserror::Error;

mod internal;
mod subprocess;

pub use internal::InternalChannel;
pub use subprocess::{SubprocessChannel, SubprocessFactory};

/// Transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// I/O failed (write error, broken pipe, failed close).
    #[error("{0}")]
    Transport(String),
    /// The engine's output does not follow the protocol framing.
    #[error("{0}")]
    Protocol(String),
    /// The channel, or the engine's end of it, has been closed.
    #[error("{0}")]
    Closed(String),
}

impl ChannelError {
    /// Short name of the failure kind, used when describing errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelError::Transport(_) => "transport error",
            ChannelError::Protocol(_) => "GTP protocol error",
            ChannelError::Closed(_) => "channel closed",
        }
    }
}

/// Bidirectional line transport to one engine.
pub trait Channel {
    /// Send one command line. `line` must end with a newline.
    fn send_command_line(&mut self, line: &str) -> Result<(), ChannelError>;

    /// Read one response line, including its trailing newline if any.
    ///
    /// An empty string means the engine closed its end cleanly.
    fn get_response_line(&mut self) -> Result<String, ChannelError>;

    /// Close the channel. Any later operation fails with [`ChannelError::Closed`].
    fn close(&mut self) -> Result<(), ChannelError>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send_command_line(&mut self, line: &str) -> Result<(), ChannelError> {
        (**self).send_command_line(line)
    }

    fn get_response_line(&mut self) -> Result<String, ChannelError> {
        (**self).get_response_line()
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        (**self).close()
    }
}

/// Something that can open a channel to an engine.
///
/// Games and controllers never start engines themselves; whoever sets up a
/// game uses a factory and hands the open channels to controllers.
pub trait ChannelFactory {
    /// The channel type produced.
    type Channel: Channel;

    /// Open a channel to the engine started by `command` with `args`.
    fn open(&self, command: &str, args: &[String]) -> anyhow::Result<Self::Channel>;
}
