//! Prefix command parsing.
//!
//! `!name arg1 arg2`: the text after the prefix is lowercased and split on
//! spaces. Text starting with digits (`!20`, `!2d6`) is a dice roll.

use lazy_static::lazy_static;
use regex::Regex;
use super::{Command, Registry};

pub const ROLL_COMMAND: &str = "r";
pub const SYNTAX_ERROR: &str = "❌ ERROR: Invalid Syntax";
pub const EXPERIMENTAL_WARNING: &str = "⚠️ This command is experimental. Set EXPERIMENTAL_COMMANDS=true to use it.";

lazy_static! {
    static ref SPACES: Regex = Regex::new(" +").unwrap();
    static ref LEADING_DIGITS: Regex = Regex::new(r"^\d+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    /// The message contains `info`: reply with the description.
    Info,
    /// The message contains `debug`.
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub name: String,
    /// Every word after the prefix, command name included.
    pub args: Vec<String>,
    pub mode: Mode,
}

/// Parse a message. `None` when it does not start with the prefix.
pub fn parse(prefix: &str, content: &str) -> Option<Parsed> {
    let text = content.strip_prefix(prefix)?;
    let lowered = text.to_lowercase();
    let args: Vec<String> = SPACES.split(&lowered).map(str::to_string).collect();
    let name = if LEADING_DIGITS.is_match(text) {
        ROLL_COMMAND.to_string()
    } else {
        args.first().cloned().unwrap_or_default()
    };
    let mode = if content.contains("info") {
        Mode::Info
    } else if content.contains("debug") {
        Mode::Debug
    } else {
        Mode::Run
    };
    Some(Parsed { name, args, mode })
}

/// What to do with a parsed command.
pub enum Action<'r> {
    /// Unknown command.
    Ignore,
    Reply(String),
    Execute(&'r dyn Command),
    Debug(&'r dyn Command),
}

pub fn resolve<'r>(registry: &'r Registry, parsed: &Parsed, experimental: bool) -> Action<'r> {
    let command = match registry.get(&parsed.name) {
        Some(command) => command,
        None => return Action::Ignore,
    };
    match parsed.mode {
        Mode::Info => Action::Reply(command.description().to_string()),
        Mode::Debug => Action::Debug(command),
        Mode::Run if command.experimental() && !experimental => Action::Reply(EXPERIMENTAL_WARNING.to_string()),
        Mode::Run => Action::Execute(command),
    }
}
