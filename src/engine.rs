//! In-process GTP engine with explicitly registered command handlers.
//!
//! The engine knows a small fixed set of protocol commands itself
//! (`protocol_version`, `known_command`, `list_commands`, `quit`). Everything
//! else, including the game commands, is added with [`GtpEngine::register`].
//!
//! Together with [`InternalChannel`](crate::channel::InternalChannel) this
//! lets a Rust engine, or a scripted test player, take part in a game without
//! a subprocess.

use std::collections::BTreeMap;

/// Result of a command handler: `Ok(text)` for success, `Err(message)` for a
/// failure response.
pub type HandlerResult = Result<String, String>;

/// A command handler, called with the command's arguments.
pub type Handler = Box<dyn FnMut(&[&str]) -> HandlerResult>;

const BUILTIN_COMMANDS: &[&str] = &["known_command", "list_commands", "protocol_version", "quit"];

/// Response to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    /// True for a `?` response.
    pub is_failure: bool,
    /// Response text, without status character.
    pub text: String,
    /// True once the engine has answered `quit`.
    pub end_session: bool,
}

/// Command dispatcher for an in-process engine.
#[derive(Default)]
pub struct GtpEngine {
    handlers: BTreeMap<String, Handler>,
}

impl std::fmt::Debug for GtpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GtpEngine")
            .field("commands", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GtpEngine {
    /// Engine knowing only the built-in protocol commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the handler for `name`.
    ///
    /// Built-in commands cannot be overridden.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: FnMut(&[&str]) -> HandlerResult + 'static,
    {
        if BUILTIN_COMMANDS.contains(&name) {
            return;
        }
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    /// Builder-style [`GtpEngine::register`].
    pub fn with_command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: FnMut(&[&str]) -> HandlerResult + 'static,
    {
        self.register(name, handler);
        self
    }

    /// True if the engine would accept `name`.
    pub fn knows(&self, name: &str) -> bool {
        BUILTIN_COMMANDS.contains(&name) || self.handlers.contains_key(name)
    }

    /// All known command names, sorted.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_COMMANDS
            .iter()
            .map(|s| s.to_string())
            .chain(self.handlers.keys().cloned())
            .collect();
        names.sort();
        names
    }

    /// Execute one command.
    pub fn run_command(&mut self, name: &str, args: &[&str]) -> EngineResponse {
        let ok = |text: String| EngineResponse {
            is_failure: false,
            text,
            end_session: false,
        };
        match name {
            "protocol_version" => ok("2".to_string()),
            "known_command" => match args.first() {
                Some(command) => ok(self.knows(command).to_string()),
                None => Self::failure("missing argument"),
            },
            "list_commands" => ok(self.command_names().join("\n")),
            "quit" => EngineResponse {
                is_failure: false,
                text: String::new(),
                end_session: true,
            },
            _ => match self.handlers.get_mut(name) {
                Some(handler) => match handler(args) {
                    Ok(text) => ok(text),
                    Err(message) => Self::failure(&message),
                },
                None => Self::failure("unknown command"),
            },
        }
    }

    fn failure(message: &str) -> EngineResponse {
        EngineResponse {
            is_failure: true,
            text: message.to_string(),
            end_session: false,
        }
    }
}
