use std::collections::VecDeque;

use tracing::trace;

use super::{Channel, ChannelError};
use crate::engine::GtpEngine;

/// Channel to an in-process [`GtpEngine`].
///
/// Each command runs as soon as it is sent; its framed response is queued
/// for the following reads. Once the engine has answered `quit`, further
/// commands fail with [`ChannelError::Closed`] and reads return EOF.
#[derive(Debug)]
pub struct InternalChannel {
    engine: GtpEngine,
    pending: VecDeque<String>,
    session_is_ended: bool,
    is_closed: bool,
}

impl InternalChannel {
    /// Channel running `engine`.
    pub fn new(engine: GtpEngine) -> Self {
        InternalChannel {
            engine,
            pending: VecDeque::new(),
            session_is_ended: false,
            is_closed: false,
        }
    }

    /// The engine behind the channel.
    pub fn engine(&self) -> &GtpEngine {
        &self.engine
    }

    /// True once [`Channel::close`] has succeeded.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// True once the engine has answered `quit`.
    pub fn session_is_ended(&self) -> bool {
        self.session_is_ended
    }

    fn check_open(&self) -> Result<(), ChannelError> {
        if self.is_closed {
            return Err(ChannelError::Closed("channel is closed".to_string()));
        }
        Ok(())
    }
}

impl Channel for InternalChannel {
    fn send_command_line(&mut self, line: &str) -> Result<(), ChannelError> {
        self.check_open()?;
        if self.session_is_ended {
            return Err(ChannelError::Closed(
                "engine has closed the command channel".to_string(),
            ));
        }
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(());
        };
        let args: Vec<&str> = words.collect();
        let response = self.engine.run_command(name, &args);
        trace!(command = name, ?response);
        if response.end_session {
            self.session_is_ended = true;
        }
        let status = if response.is_failure { '?' } else { '=' };
        let mut lines = response.text.lines();
        let first = lines.next().unwrap_or("");
        if first.is_empty() {
            self.pending.push_back(format!("{status}\n"));
        } else {
            self.pending.push_back(format!("{status} {first}\n"));
        }
        self.pending.extend(lines.map(|l| format!("{l}\n")));
        self.pending.push_back("\n".to_string());
        Ok(())
    }

    fn get_response_line(&mut self) -> Result<String, ChannelError> {
        self.check_open()?;
        match self.pending.pop_front() {
            Some(line) => Ok(line),
            None if self.session_is_ended => Ok(String::new()),
            None => Err(ChannelError::Protocol(
                "response requested without a command".to_string(),
            )),
        }
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.check_open()?;
        self.is_closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(channel: &mut InternalChannel) -> Vec<String> {
        let mut lines = vec![];
        loop {
            let line = channel.get_response_line().unwrap();
            lines.push(line.clone());
            if line == "\n" || line.is_empty() {
                return lines;
            }
        }
    }

    #[test]
    fn test_framed_response() {
        let engine = GtpEngine::new().with_command("showboard", |_| Ok("a\nb".to_string()));
        let mut channel = InternalChannel::new(engine);
        channel.send_command_line("showboard\n").unwrap();
        assert_eq!(read_all(&mut channel), vec!["= a\n", "b\n", "\n"]);
    }

    #[test]
    fn test_failure_response() {
        let mut channel = InternalChannel::new(GtpEngine::new());
        channel.send_command_line("genmove b\n").unwrap();
        assert_eq!(read_all(&mut channel), vec!["? unknown command\n", "\n"]);
    }

    #[test]
    fn test_quit_ends_session() {
        let mut channel = InternalChannel::new(GtpEngine::new());
        channel.send_command_line("quit\n").unwrap();
        assert_eq!(read_all(&mut channel), vec!["=\n", "\n"]);
        assert_eq!(channel.get_response_line().unwrap(), "");
        assert!(channel.session_is_ended());
        assert!(matches!(
            channel.send_command_line("name\n"),
            Err(ChannelError::Closed(_))
        ));
    }

    #[test]
    fn test_closed_channel() {
        let mut channel = InternalChannel::new(GtpEngine::new());
        channel.close().unwrap();
        assert!(channel.is_closed());
        assert!(matches!(
            channel.send_command_line("quit\n"),
            Err(ChannelError::Closed(_))
        ));
        assert!(matches!(channel.close(), Err(ChannelError::Closed(_))));
    }
}
