//! Core of the application.
//! Builds the components and the Discord client.

use std::sync::Arc;
use jester_core::ComponentContainer;
use serenity::{Client, prelude::GatewayIntents};
use crate::{
    components as cmp,
    config::Config,
    error::Result,
    log_info,
    tracker::SessionStore,
};

/// The bot.
///
/// The components are placed in a [ComponentContainer], which gives the client
/// a dispatcher forwarding every gateway event to them.
pub struct Bot {
    client: Client,
    masquerade: Arc<cmp::Masquerade>,
}

impl Bot {
    /// Gateway events the components need.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_TYPING
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::MESSAGE_CONTENT
    }
    /// Create the bot and its components.
    pub async fn new(config: &Config) -> Result<Bot> {
        let sessions = Arc::new(SessionStore::new());
        let mut container = ComponentContainer::new();
        container.add_component(cmp::PrefixCommands::new(config, Arc::clone(&sessions)));
        let masquerade = container.add_component(cmp::Masquerade::new(config, sessions));
        let names = container.names();
        container.add_component(cmp::Misc::new(names));
        let client = Client::builder(&config.token, Self::intents())
            .raw_event_handler(container.get_event_dispatcher())
            .await?;
        Ok(Bot {
            client,
            masquerade,
        })
    }
    /// Run the bot until the client stops or Ctrl-C is received.
    pub async fn start(&mut self) -> Result<()> {
        let shard_manager = Arc::clone(&self.client.shard_manager);
        let result = tokio::select! {
            res = self.client.start() => res.map_err(Into::into),
            _ = tokio::signal::ctrl_c() => {
                log_info!("Shutting down");
                shard_manager.lock().await.shutdown_all().await;
                Ok(())
            }
        };
        self.masquerade.shutdown().await;
        result
    }
}
