use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::Context;
use tracing::{instrument, warn};

use super::{Channel, ChannelError, ChannelFactory};

/// Line channel over the stdin and stdout of an engine process.
///
/// The process is killed on drop if the channel was never closed.
#[derive(Debug)]
pub struct SubprocessChannel {
    child: Child,
    command_pipe: Option<ChildStdin>,
    response_pipe: BufReader<ChildStdout>,
    is_closed: bool,
}

impl SubprocessChannel {
    /// Wrap a child process started with piped stdin and stdout.
    pub fn new(mut child: Child) -> anyhow::Result<SubprocessChannel> {
        let command_pipe = child.stdin.take().context("engine stdin is not piped")?;
        let response_pipe = child.stdout.take().context("engine stdout is not piped")?;
        Ok(SubprocessChannel {
            child,
            command_pipe: Some(command_pipe),
            response_pipe: BufReader::new(response_pipe),
            is_closed: false,
        })
    }

    /// Process id of the engine.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn check_open(&self) -> Result<(), ChannelError> {
        if self.is_closed {
            return Err(ChannelError::Closed("channel is closed".to_string()));
        }
        Ok(())
    }
}

impl Channel for SubprocessChannel {
    fn send_command_line(&mut self, line: &str) -> Result<(), ChannelError> {
        self.check_open()?;
        let pipe = self
            .command_pipe
            .as_mut()
            .ok_or_else(|| ChannelError::Closed("command pipe is closed".to_string()))?;
        pipe.write_all(line.as_bytes())
            .and_then(|_| pipe.flush())
            .map_err(|e| ChannelError::Transport(format!("error writing to engine: {e}")))
    }

    fn get_response_line(&mut self) -> Result<String, ChannelError> {
        self.check_open()?;
        let mut buf = Vec::new();
        self.response_pipe
            .read_until(b'\n', &mut buf)
            .map_err(|e| ChannelError::Transport(format!("error reading from engine: {e}")))?;
        String::from_utf8(buf)
            .map_err(|_| ChannelError::Protocol("engine sent a line that is not UTF-8".to_string()))
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.check_open()?;
        self.is_closed = true;
        // closing stdin is the engine's signal to exit
        drop(self.command_pipe.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ChannelError::Transport(format!("error waiting for engine: {e}")))?;
        if !status.success() {
            return Err(ChannelError::Transport(format!(
                "engine exited with failure status ({status})"
            )));
        }
        Ok(())
    }
}

impl Drop for SubprocessChannel {
    fn drop(&mut self) {
        if !self.is_closed {
            if let Err(e) = self.child.kill() {
                warn!("could not kill engine process {}: {e}", self.child.id());
            }
            let _ = self.child.wait();
        }
    }
}

/// Opens [`SubprocessChannel`]s by spawning engine commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessFactory {
    allow_stderr: bool,
}

impl SubprocessFactory {
    /// Factory that silences engine stderr.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let engine stderr through to ours (debug purposes).
    pub fn with_allow_stderr(mut self, value: bool) -> Self {
        self.allow_stderr = value;
        self
    }
}

impl ChannelFactory for SubprocessFactory {
    type Channel = SubprocessChannel;

    #[instrument(skip(self))]
    fn open(&self, command: &str, args: &[String]) -> anyhow::Result<SubprocessChannel> {
        let mut cmd = Command::new(command);
        cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped());
        if !self.allow_stderr {
            cmd.stderr(Stdio::null());
        }
        let child = cmd
            .spawn()
            .with_context(|| format!("command '{command}' not found"))?;
        SubprocessChannel::new(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_echoes_lines() {
        let mut channel = SubprocessFactory::new().open("cat", &[]).unwrap();
        channel.send_command_line("= ok\n").unwrap();
        assert_eq!(channel.get_response_line().unwrap(), "= ok\n");
        channel.close().unwrap();
    }

    #[test]
    fn test_operations_after_close() {
        let mut channel = SubprocessFactory::new().open("cat", &[]).unwrap();
        channel.close().unwrap();
        assert!(matches!(
            channel.send_command_line("name\n"),
            Err(ChannelError::Closed(_))
        ));
        assert!(matches!(
            channel.get_response_line(),
            Err(ChannelError::Closed(_))
        ));
        assert!(matches!(channel.close(), Err(ChannelError::Closed(_))));
    }

    #[test]
    fn test_eof_is_empty_line() {
        let mut channel = SubprocessFactory::new().open("true", &[]).unwrap();
        assert_eq!(channel.get_response_line().unwrap(), "");
    }

    #[test]
    fn test_failure_exit_status() {
        let mut channel = SubprocessFactory::new().open("false", &[]).unwrap();
        assert!(matches!(channel.close(), Err(ChannelError::Transport(_))));
    }

    #[test]
    fn test_missing_command() {
        let err = SubprocessFactory::new()
            .open("/nonexistent/gtp-engine", &[])
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
