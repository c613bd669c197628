use serenity::model::id::{ChannelId, UserId};

/// Kind of signal received for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Message,
    TypingStart,
    /// The member is now connected to the voice channel given in the activity.
    VoiceJoin,
    /// The member is not connected to any voice channel anymore.
    VoiceLeave,
}

impl ActivityKind {
    pub fn is_voice(self) -> bool {
        matches!(self, ActivityKind::VoiceJoin | ActivityKind::VoiceLeave)
    }
}

/// Something a member did somewhere on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub user_id: UserId,
    /// Channel of the activity. `None` for [`ActivityKind::VoiceLeave`].
    pub channel_id: Option<ChannelId>,
    pub kind: ActivityKind,
}

impl Activity {
    pub fn message(user_id: UserId, channel_id: ChannelId) -> Self {
        Activity { user_id, channel_id: Some(channel_id), kind: ActivityKind::Message }
    }
    pub fn typing(user_id: UserId, channel_id: ChannelId) -> Self {
        Activity { user_id, channel_id: Some(channel_id), kind: ActivityKind::TypingStart }
    }
    /// Build the activity of a voice state update: connected to `channel_id`, or disconnected.
    pub fn voice(user_id: UserId, channel_id: Option<ChannelId>) -> Self {
        let kind = match channel_id {
            Some(_) => ActivityKind::VoiceJoin,
            None => ActivityKind::VoiceLeave,
        };
        Activity { user_id, channel_id, kind }
    }
}
