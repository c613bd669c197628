//! Prefix commands.
//!
//! Each command lives in its own module and is registered in the [`Registry`]
//! when the component is built.

mod help;
mod nick;
mod parser;
mod ping;
mod roll;

use std::sync::Arc;
use jester_core::{Component, ComponentEvent};
use serenity::{
    async_trait,
    client::Context,
    model::{event::Event, id::UserId, user::User},
};
use crate::{
    config::Config,
    log_error, log_info, log_warn,
    tracker::SessionStore,
};
use self::parser::Action;

/// Arguments given to a command.
pub struct Call<'a> {
    pub author: UserId,
    /// Words of the message, command name included.
    pub args: &'a [String],
    pub registry: &'a Registry,
    pub env: &'a CommandEnv,
}

/// Data shared with the commands.
pub struct CommandEnv {
    pub override_nickname: String,
    pub sessions: Arc<SessionStore>,
}

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Experimental commands only run when enabled in the configuration.
    fn experimental(&self) -> bool {
        false
    }
    /// Run the command. Returns the reply, or the reason of the failure.
    async fn execute(&self, call: &Call<'_>) -> Result<String, String>;
    async fn debug(&self, call: &Call<'_>) -> Result<String, String> {
        Ok(format!("`{}` called by {} with {:?}", self.name(), call.author, call.args))
    }
}

#[derive(Default)]
pub struct Registry(Vec<Box<dyn Command>>);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registry with every command of the bot.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ping::Ping);
        registry.register(help::Help);
        registry.register(roll::Roll);
        registry.register(nick::Nick);
        registry
    }
    /// Add a command. A command with the same name is replaced.
    pub fn register<C: Command + 'static>(&mut self, command: C) {
        self.0.retain(|c| c.name() != command.name());
        self.0.push(Box::new(command));
    }
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.0.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.0.iter().map(|c| c.as_ref())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct PrefixCommands {
    prefix: String,
    experimental: bool,
    registry: Registry,
    env: CommandEnv,
}

impl PrefixCommands {
    pub fn new(config: &Config, sessions: Arc<SessionStore>) -> Self {
        let registry = Registry::with_defaults();
        log_info!("commands: {} command(s) loaded, prefix {:?}", registry.len(), config.prefix);
        PrefixCommands {
            prefix: config.prefix.clone(),
            experimental: config.experimental,
            registry,
            env: CommandEnv {
                override_nickname: config.tracker.override_nickname.clone(),
                sessions,
            },
        }
    }
    /// Reply to a message, or `None` when the message is not a known command.
    /// Bots are never answered.
    async fn reply_for(&self, author: &User, content: &str) -> Option<String> {
        if author.bot {
            return None;
        }
        let parsed = parser::parse(&self.prefix, content)?;
        let call = Call {
            author: author.id,
            args: &parsed.args,
            registry: &self.registry,
            env: &self.env,
        };
        let result = match parser::resolve(&self.registry, &parsed, self.experimental) {
            Action::Ignore => return None,
            Action::Reply(text) => return Some(text),
            Action::Execute(command) => command.execute(&call).await,
            Action::Debug(command) => command.debug(&call).await,
        };
        Some(result.unwrap_or_else(|e| {
            log_error!("commands: {} failed: {}", parsed.name, e);
            parser::SYNTAX_ERROR.to_string()
        }))
    }
}

#[async_trait]
impl ComponentEvent for PrefixCommands {
    async fn event(&self, ctx: &Context, event: &Event) {
        let msg = match event {
            Event::MessageCreate(evt) => &evt.message,
            _ => return,
        };
        if let Some(reply) = self.reply_for(&msg.author, &msg.content).await {
            if let Err(e) = msg.reply(ctx, reply).await {
                log_warn!("commands: unable to reply in {}: {}", msg.channel_id, e);
            }
        }
    }
}

impl Component for PrefixCommands {
    fn name(&self) -> &'static str {
        "commands"
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn env() -> CommandEnv {
        CommandEnv {
            override_nickname: "Jester".to_string(),
            sessions: Arc::new(SessionStore::new()),
        }
    }
    pub fn words(text: &str) -> Vec<String> {
        text.split(' ').map(str::to_string).collect()
    }
}
