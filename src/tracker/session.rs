//! Session table of the tracker.

use std::collections::{HashMap, HashSet};
use serenity::model::id::{RoleId, UserId};
use tokio::sync::RwLock;
use super::timer::TimerId;

/// State saved before overriding a member, used to restore it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    /// Nickname before the override. `None` when the member had no nickname.
    pub original_nickname: Option<String>,
    /// Roles before the override. Only saved when a color role is configured.
    pub original_roles: Option<HashSet<RoleId>>,
    /// Whether every override call succeeded.
    pub active: bool,
    /// Whether the member sits in the target voice channel.
    pub voice_present: bool,
    /// Timer of the pending restore, if any.
    pub pending_restore: Option<TimerId>,
}

impl Session {
    pub fn new(user_id: UserId, original_nickname: Option<String>, original_roles: Option<HashSet<RoleId>>) -> Self {
        Session {
            user_id,
            original_nickname,
            original_roles,
            active: false,
            voice_present: false,
            pending_restore: None,
        }
    }
}

/// Sessions of the members currently overridden.
///
/// Only the tracker writes into the store. Anyone holding the store may read it.
#[derive(Debug, Default)]
pub struct SessionStore(RwLock<HashMap<UserId, Session>>);

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub async fn get(&self, user_id: UserId) -> Option<Session> {
        self.0.read().await.get(&user_id).cloned()
    }
    pub async fn contains(&self, user_id: UserId) -> bool {
        self.0.read().await.contains_key(&user_id)
    }
    pub async fn len(&self) -> usize {
        self.0.read().await.len()
    }
    pub async fn is_empty(&self) -> bool {
        self.0.read().await.is_empty()
    }
    /// Every session, ordered by user.
    pub async fn all(&self) -> Vec<Session> {
        let mut sessions: Vec<_> = self.0.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.user_id);
        sessions
    }

    pub(super) async fn insert(&self, session: Session) {
        self.0.write().await.insert(session.user_id, session);
    }
    /// Apply `f` to the session of `user_id`. Returns `None` if there is no session.
    pub(super) async fn update<F, R>(&self, user_id: UserId, f: F) -> Option<R>
        where F: FnOnce(&mut Session) -> R
    {
        self.0.write().await.get_mut(&user_id).map(f)
    }
    pub(super) async fn remove(&self, user_id: UserId) -> Option<Session> {
        self.0.write().await.remove(&user_id)
    }
}
