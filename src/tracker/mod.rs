//! Identity override tracker.
//!
//! While an allowed member is active in the target channel, their nickname is
//! replaced (and a color role added). Once they leave, or stay quiet for the
//! configured delay, the saved state is put back.
//!
//! A member is either *normal* (no session) or *overridden* (a session exists).
//! - Any activity inside the target creates the session with a snapshot of the
//!   member, then applies the override.
//! - More activity inside the target only restarts the inactivity timer.
//! - Leaving the target voice channel, a message outside the target (when no
//!   inactivity timer is configured) or the timer expiring restores the member
//!   and deletes the session.
//!
//! Any true signal wins: while the member sits in the target voice channel,
//! messages elsewhere and timer expiry are ignored.

mod activity;
mod identity;
mod locks;
mod session;
mod timer;

use std::{collections::HashSet, str::FromStr, sync::Arc, time::Duration};
use serde::Deserialize;
use serenity::model::id::{ChannelId, RoleId, UserId};
use crate::{error::Error, log_debug, log_error, log_info, log_warn};

pub use activity::{Activity, ActivityKind};
pub use identity::IdentityService;
pub use locks::UserLocks;
pub use session::{Session, SessionStore};
pub use timer::{RestoreTimers, TimerId};

/// How roles are put back on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleRestore {
    /// Remove the color role, unless the member already had it before.
    #[default]
    Remove,
    /// Reset the roles of the member to the saved set.
    Snapshot,
}

impl FromStr for RoleRestore {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remove" => Ok(RoleRestore::Remove),
            "snapshot" => Ok(RoleRestore::Snapshot),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub target_channel: Option<ChannelId>,
    pub target_voice_channel: Option<ChannelId>,
    /// Nickname applied while overridden. Empty disables the nickname override.
    pub override_nickname: String,
    pub color_role: Option<RoleId>,
    pub role_restore: RoleRestore,
    pub allowed_users: HashSet<UserId>,
    /// Inactivity delay before the automatic restore.
    pub restore_delay: Option<Duration>,
}

/// What the tracker does, derived from its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub override_nickname: bool,
    pub override_role: bool,
    pub inactivity_timer: Option<Duration>,
}

impl TrackerConfig {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            override_nickname: !self.override_nickname.is_empty(),
            override_role: self.color_role.is_some(),
            inactivity_timer: self.restore_delay,
        }
    }
    /// Whether the activity happened in the target channel.
    pub fn is_inside(&self, activity: &Activity) -> bool {
        let target = match activity.kind {
            ActivityKind::Message | ActivityKind::TypingStart => self.target_channel,
            ActivityKind::VoiceJoin => self.target_voice_channel,
            ActivityKind::VoiceLeave => return false,
        };
        target.is_some() && activity.channel_id == target
    }
}

/// Outcome of an activity, mostly for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The member is not allowed, or cannot be resolved.
    Ignored,
    /// Nothing to do.
    Unchanged,
    /// The override was (re)applied.
    Activated,
    /// Already overridden: the inactivity timer was restarted.
    Refreshed,
    /// The saved state was put back and the session deleted.
    Restored,
}

pub struct OverrideTracker<I: IdentityService> {
    inner: Arc<Inner<I>>,
}

impl<I: IdentityService> Clone for OverrideTracker<I> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<I> {
    config: TrackerConfig,
    capabilities: Capabilities,
    identity: I,
    sessions: Arc<SessionStore>,
    locks: UserLocks,
    timers: RestoreTimers,
}

impl<I: IdentityService> OverrideTracker<I> {
    pub fn new(config: TrackerConfig, identity: I, sessions: Arc<SessionStore>) -> Self {
        let capabilities = config.capabilities();
        OverrideTracker {
            inner: Arc::new(Inner {
                config,
                capabilities,
                identity,
                sessions,
                locks: UserLocks::new(),
                timers: RestoreTimers::new(),
            })
        }
    }
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.inner.sessions
    }
    #[cfg(test)]
    pub fn identity(&self) -> &I {
        &self.inner.identity
    }
    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.inner.config.allowed_users.contains(&user_id)
    }
    /// Handle an activity of a member. Failures are logged, never returned.
    pub async fn handle(&self, activity: Activity) -> Transition {
        if !self.is_allowed(activity.user_id) {
            return Transition::Ignored;
        }
        self.inner.handle(activity).await
    }
    /// Number of restores waiting for their timer.
    pub async fn pending_restores(&self) -> usize {
        self.inner.timers.pending().await
    }
    /// Cancel every pending restore.
    ///
    /// Sessions are not persisted: the members still overridden keep the
    /// override until someone renames them. They are logged with their
    /// original nickname and returned.
    pub async fn shutdown(&self) -> Vec<Session> {
        let count = self.inner.timers.cancel_all().await;
        if count > 0 {
            log_info!("Override tracker: {} pending restore(s) cancelled", count);
        }
        let left = self.inner.sessions.all().await;
        for session in &left {
            log_warn!("Override of {}: still overridden at shutdown, original nickname {:?}", session.user_id, session.original_nickname);
        }
        left
    }
}

impl<I: IdentityService> Inner<I> {
    async fn handle(self: &Arc<Self>, activity: Activity) -> Transition {
        let user_id = activity.user_id;
        let _guard = self.locks.lock(user_id).await;
        if self.config.is_inside(&activity) {
            return self.activate(user_id, activity.kind == ActivityKind::VoiceJoin).await;
        }
        let timed = self.capabilities.inactivity_timer.is_some();
        match activity.kind {
            kind if kind.is_voice() => {
                let was_present = match self.sessions.update(user_id, |s| std::mem::replace(&mut s.voice_present, false)).await {
                    Some(was_present) => was_present,
                    None => return Transition::Unchanged,
                };
                if was_present || !timed {
                    self.restore(user_id).await
                } else {
                    Transition::Unchanged
                }
            },
            ActivityKind::Message if !timed => {
                match self.sessions.get(user_id).await {
                    Some(session) if !session.voice_present => self.restore(user_id).await,
                    _ => Transition::Unchanged,
                }
            },
            _ => Transition::Unchanged,
        }
    }

    async fn activate(self: &Arc<Self>, user_id: UserId, voice: bool) -> Transition {
        let existing = self.sessions.get(user_id).await;
        if voice && existing.is_some() {
            self.sessions.update(user_id, |s| s.voice_present = true).await;
        }
        if let Some(Session { active: true, .. }) = existing {
            self.refresh_timer(user_id, voice).await;
            return Transition::Refreshed;
        }

        let (nickname, roles) = match self.read_member(user_id).await {
            Ok(state) => state,
            Err(Error::MissingMember(_)) => {
                log_debug!("Override of {}: member not found, activity dropped", user_id);
                return Transition::Ignored;
            },
            Err(e) => {
                log_error!("Override of {}: unable to read the member: {}", user_id, e);
                return Transition::Unchanged;
            }
        };
        if existing.is_none() {
            let mut session = Session::new(user_id, nickname.clone(), roles.clone());
            session.voice_present = voice;
            self.sessions.insert(session).await;
            log_debug!("Override of {}: session created, original nickname {:?}", user_id, nickname);
        }

        let applied = self.apply_override(user_id, nickname.as_deref(), roles.as_ref()).await;
        self.sessions.update(user_id, |s| s.active = applied).await;
        self.refresh_timer(user_id, voice).await;
        Transition::Activated
    }

    /// Read the current nickname, and roles when a color role is configured.
    async fn read_member(&self, user_id: UserId) -> crate::error::Result<(Option<String>, Option<HashSet<RoleId>>)> {
        let nickname = self.identity.current_nickname(user_id).await?;
        let roles = match self.capabilities.override_role {
            true => Some(self.identity.current_roles(user_id).await?),
            false => None,
        };
        Ok((nickname, roles))
    }

    /// Apply the override where the member differs from it. Returns whether every call succeeded.
    async fn apply_override(&self, user_id: UserId, nickname: Option<&str>, roles: Option<&HashSet<RoleId>>) -> bool {
        let mut applied = true;
        let target = self.config.override_nickname.as_str();
        if self.capabilities.override_nickname && nickname != Some(target) {
            match self.identity.set_nickname(user_id, Some(target)).await {
                Ok(_) => log_info!("Override of {}: nickname changed to {}", user_id, target),
                Err(e) => {
                    log_error!("Override of {}: unable to change the nickname: {}", user_id, e);
                    applied = false;
                }
            }
        }
        if let (Some(role), Some(roles)) = (self.config.color_role, roles) {
            if !roles.contains(&role) {
                match self.identity.add_role(user_id, role).await {
                    Ok(_) => log_info!("Override of {}: role {} added", user_id, role),
                    Err(e) => {
                        log_error!("Override of {}: unable to add role {}: {}", user_id, role, e);
                        applied = false;
                    }
                }
            }
        }
        applied
    }

    /// Restart the inactivity timer, or stop it while the member is in the voice channel.
    async fn refresh_timer(self: &Arc<Self>, user_id: UserId, voice: bool) {
        let delay = match self.capabilities.inactivity_timer {
            Some(delay) => delay,
            None => return,
        };
        let in_voice = voice || matches!(self.sessions.get(user_id).await, Some(s) if s.voice_present);
        if in_voice {
            self.timers.cancel(user_id).await;
            self.sessions.update(user_id, |s| s.pending_restore = None).await;
            return;
        }
        let inner = Arc::downgrade(self);
        let id = self.timers.schedule(user_id, delay, move |id| async move {
            if let Some(inner) = inner.upgrade() {
                inner.expire(user_id, id).await;
            }
        }).await;
        self.sessions.update(user_id, |s| s.pending_restore = Some(id)).await;
    }

    async fn expire(self: Arc<Self>, user_id: UserId, id: TimerId) {
        let _guard = self.locks.lock(user_id).await;
        self.timers.finish(user_id, id).await;
        let session = match self.sessions.get(user_id).await {
            Some(session) if session.pending_restore == Some(id) => session,
            _ => return,
        };
        if session.voice_present {
            self.sessions.update(user_id, |s| s.pending_restore = None).await;
            return;
        }
        log_debug!("Override of {}: inactive for {:?}", user_id, self.capabilities.inactivity_timer);
        self.restore(user_id).await;
    }

    /// Put back the saved state of the member and delete the session.
    /// Failures are logged: the session is deleted anyway.
    async fn restore(&self, user_id: UserId) -> Transition {
        self.timers.cancel(user_id).await;
        let session = match self.sessions.get(user_id).await {
            Some(session) => session,
            None => return Transition::Unchanged,
        };
        if self.capabilities.override_nickname {
            let original = session.original_nickname.as_deref();
            match self.identity.set_nickname(user_id, original).await {
                Ok(_) => log_info!("Override of {}: nickname restored to {:?}", user_id, original),
                Err(e) => log_error!("Override of {}: unable to restore the nickname: {}", user_id, e),
            }
        }
        if let Some(role) = self.config.color_role {
            self.restore_roles(user_id, role, session.original_roles.as_ref()).await;
        }
        self.sessions.remove(user_id).await;
        Transition::Restored
    }

    async fn restore_roles(&self, user_id: UserId, role: RoleId, original: Option<&HashSet<RoleId>>) {
        let result = match (self.config.role_restore, original) {
            (RoleRestore::Snapshot, Some(roles)) => self.identity.set_roles(user_id, roles).await,
            (_, Some(roles)) if roles.contains(&role) => return,
            _ => self.identity.remove_role(user_id, role).await,
        };
        if let Err(e) = result {
            log_warn!("Override of {}: unable to restore the roles: {}", user_id, e);
        }
    }
}
