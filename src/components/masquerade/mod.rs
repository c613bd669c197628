//! Nickname override of the members active in the target channel.
//!
//! Translates the gateway events into tracker activities. The tracker is
//! created on the first event of the server, since it needs the client context.

mod identity;

use std::sync::Arc;
use jester_core::{Component, ComponentEvent};
use serenity::{
    async_trait,
    client::Context,
    model::{event::Event, id::GuildId},
};
use tokio::sync::OnceCell;
use crate::{
    config::Config,
    log_debug, log_info, log_warn,
    tracker::{Activity, OverrideTracker, SessionStore, TrackerConfig, Transition},
};
pub use identity::SerenityIdentity;

/// Server the bot works on: the configured one, or the first one an event comes from.
struct GuildBinding<T> {
    server_id: Option<GuildId>,
    bound: OnceCell<(GuildId, T)>,
}

impl<T> GuildBinding<T> {
    fn new(server_id: Option<GuildId>) -> Self {
        GuildBinding { server_id, bound: OnceCell::new() }
    }
    /// Value bound to the server, built by `init` on first use.
    /// `None` for direct messages and for the other servers.
    async fn resolve<F>(&self, guild_id: Option<GuildId>, init: F) -> Option<&T>
        where F: FnOnce(GuildId) -> T
    {
        let guild_id = guild_id?;
        let (bound, value) = self.bound.get_or_init(|| async {
            let bound = self.server_id.unwrap_or(guild_id);
            (bound, init(bound))
        }).await;
        (*bound == guild_id).then_some(value)
    }
    fn get(&self) -> Option<&T> {
        self.bound.get().map(|(_, value)| value)
    }
}

/// Activity carried by a gateway event, with the server it happened on.
fn activity_of(event: &Event) -> Option<(Option<GuildId>, Activity)> {
    match event {
        Event::MessageCreate(evt) if !evt.message.author.bot => {
            let msg = &evt.message;
            Some((msg.guild_id, Activity::message(msg.author.id, msg.channel_id)))
        },
        Event::TypingStart(evt) => Some((evt.guild_id, Activity::typing(evt.user_id, evt.channel_id))),
        Event::VoiceStateUpdate(evt) => {
            let state = &evt.voice_state;
            Some((state.guild_id, Activity::voice(state.user_id, state.channel_id)))
        },
        _ => None,
    }
}

pub struct Masquerade {
    config: TrackerConfig,
    sessions: Arc<SessionStore>,
    tracker: GuildBinding<OverrideTracker<SerenityIdentity>>,
}

impl Masquerade {
    pub fn new(config: &Config, sessions: Arc<SessionStore>) -> Self {
        Masquerade {
            config: config.tracker.clone(),
            sessions,
            tracker: GuildBinding::new(config.server_id),
        }
    }
    async fn on_activity(&self, ctx: &Context, guild_id: Option<GuildId>, activity: Activity) {
        if !self.config.allowed_users.contains(&activity.user_id) {
            return;
        }
        let tracker = self.tracker.resolve(guild_id, |bound| {
            log_info!("masquerade: tracking server {}", bound);
            let identity = SerenityIdentity::new(ctx.clone(), bound);
            OverrideTracker::new(self.config.clone(), identity, Arc::clone(&self.sessions))
        }).await;
        let tracker = match tracker {
            Some(tracker) => tracker,
            None => return,
        };
        match tracker.handle(activity).await {
            Transition::Unchanged | Transition::Ignored => (),
            transition => log_debug!("masquerade: {:?} -> {:?}", activity, transition),
        }
    }
    /// Cancel the pending restores.
    pub async fn shutdown(&self) {
        if let Some(tracker) = self.tracker.get() {
            let left = tracker.shutdown().await;
            if !left.is_empty() {
                log_warn!("masquerade: {} member(s) keep the override nickname", left.len());
            }
        }
    }
}

#[async_trait]
impl ComponentEvent for Masquerade {
    async fn event(&self, ctx: &Context, event: &Event) {
        if let Some((guild_id, activity)) = activity_of(event) {
            self.on_activity(ctx, guild_id, activity).await
        }
    }
}

impl Component for Masquerade {
    fn name(&self) -> &'static str {
        "masquerade"
    }
}

#[cfg(test)]
mod tests {
    use serenity::{
        json::json,
        model::{event::{MessageCreateEvent, TypingStartEvent, VoiceStateUpdateEvent}, id::{ChannelId, UserId}},
    };
    use crate::tracker::ActivityKind;
    use super::*;

    fn message(author_bot: bool, guild_id: Option<u64>) -> Event {
        let mut message = json!({
            "id": "1",
            "channel_id": "100",
            "author": {"id": "7", "username": "alice", "discriminator": "0001", "avatar": null, "bot": author_bot},
            "content": "hello",
            "timestamp": "2022-06-01T12:00:00Z",
            "edited_timestamp": null,
            "tts": false,
            "mention_everyone": false,
            "mentions": [],
            "mention_roles": [],
            "attachments": [],
            "embeds": [],
            "pinned": false,
            "type": 0,
        });
        if let Some(guild_id) = guild_id {
            message["guild_id"] = json!(guild_id.to_string());
        }
        Event::MessageCreate(serde_json::from_value::<MessageCreateEvent>(message).unwrap())
    }
    fn voice(channel_id: Option<u64>) -> Event {
        let state = json!({
            "guild_id": "5",
            "channel_id": channel_id.map(|id| id.to_string()),
            "user_id": "7",
            "session_id": "abc",
            "deaf": false,
            "mute": false,
            "self_deaf": false,
            "self_mute": false,
            "self_video": false,
            "suppress": false,
            "request_to_speak_timestamp": null,
        });
        Event::VoiceStateUpdate(serde_json::from_value::<VoiceStateUpdateEvent>(state).unwrap())
    }

    #[test]
    fn messages_from_bots_are_dropped() {
        assert!(activity_of(&message(true, Some(5))).is_none());
        let (guild_id, activity) = activity_of(&message(false, Some(5))).unwrap();
        assert_eq!(guild_id, Some(GuildId(5)));
        assert_eq!(activity, Activity::message(UserId(7), ChannelId(100)));
    }
    #[test]
    fn direct_messages_carry_no_server() {
        let (guild_id, _) = activity_of(&message(false, None)).unwrap();
        assert_eq!(guild_id, None);
    }
    #[test]
    fn typing() {
        let evt: TypingStartEvent = serde_json::from_value(json!({
            "guild_id": "5",
            "channel_id": "100",
            "timestamp": 1654084800,
            "user_id": "7",
        })).unwrap();
        let (guild_id, activity) = activity_of(&Event::TypingStart(evt)).unwrap();
        assert_eq!(guild_id, Some(GuildId(5)));
        assert_eq!(activity.kind, ActivityKind::TypingStart);
    }
    #[test]
    fn voice_join_and_leave() {
        let (_, join) = activity_of(&voice(Some(300))).unwrap();
        assert_eq!(join, Activity::voice(UserId(7), Some(ChannelId(300))));
        assert_eq!(join.kind, ActivityKind::VoiceJoin);
        let (_, leave) = activity_of(&voice(None)).unwrap();
        assert_eq!(leave.kind, ActivityKind::VoiceLeave);
        assert_eq!(leave.channel_id, None);
    }

    #[tokio::test]
    async fn binds_the_first_server_seen() {
        let binding = GuildBinding::new(None);
        assert_eq!(binding.resolve(None, |guild| guild.0).await, None);
        assert!(binding.get().is_none());
        assert_eq!(binding.resolve(Some(GuildId(5)), |guild| guild.0).await, Some(&5));
        assert_eq!(binding.resolve(Some(GuildId(6)), |guild| guild.0).await, None);
        assert_eq!(binding.resolve(Some(GuildId(5)), |_| unreachable!()).await, Some(&5));
    }
    #[tokio::test]
    async fn configured_server_wins() {
        let binding = GuildBinding::new(Some(GuildId(6)));
        assert_eq!(binding.resolve(Some(GuildId(5)), |guild| guild.0).await, None);
        assert_eq!(binding.get(), Some(&6));
        assert_eq!(binding.resolve(Some(GuildId(6)), |_| unreachable!()).await, Some(&6));
    }
}
