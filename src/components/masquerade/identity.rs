//! [`IdentityService`] backed by the Discord API.
//!
//! Every read goes to the API: the cached member is only updated when the
//! gateway echoes our own edits back, which comes too late to take a snapshot.

use std::collections::HashSet;
use serenity::{
    async_trait,
    client::Context,
    http::error::Error as HttpError,
    json::{JsonMap, Value},
    model::{guild::Member, id::{GuildId, RoleId, UserId}},
};
use crate::{
    error::{Error, Result},
    tracker::IdentityService,
};

const AUDIT_REASON: &str = "Nickname override";

/// Members of one server.
pub struct SerenityIdentity {
    ctx: Context,
    guild_id: GuildId,
}

impl SerenityIdentity {
    pub fn new(ctx: Context, guild_id: GuildId) -> Self {
        Self { ctx, guild_id }
    }
    async fn member(&self, user_id: UserId) -> Result<Member> {
        self.ctx.http.get_member(self.guild_id.0, user_id.0).await
            .map_err(|e| member_error(user_id, e))
    }
    async fn edit(&self, user_id: UserId, map: JsonMap) -> Result<()> {
        self.ctx.http.edit_member(self.guild_id.0, user_id.0, &map, Some(AUDIT_REASON)).await
            .map_err(|e| member_error(user_id, e))?;
        Ok(())
    }
}

/// An unknown member is reported apart from the other failures.
fn member_error(user_id: UserId, e: serenity::Error) -> Error {
    let not_found = match &e {
        serenity::Error::Http(http) => matches!(http.as_ref(), HttpError::UnsuccessfulRequest(resp) if resp.status_code.as_u16() == 404),
        _ => false,
    };
    if not_found {
        Error::MissingMember(user_id)
    } else {
        e.into()
    }
}

/// Body of a nickname edit. A null nickname resets it.
fn nickname_edit(nickname: Option<&str>) -> JsonMap {
    let mut map = JsonMap::new();
    map.insert("nick".to_string(), nickname.map_or(Value::Null, Value::from));
    map
}

/// Body of a role set edit.
fn roles_edit(roles: &HashSet<RoleId>) -> JsonMap {
    let mut ids: Vec<u64> = roles.iter().map(|role| role.0).collect();
    ids.sort_unstable();
    let mut map = JsonMap::new();
    map.insert("roles".to_string(), Value::from(ids));
    map
}

#[async_trait]
impl IdentityService for SerenityIdentity {
    async fn current_nickname(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self.member(user_id).await?.nick)
    }
    async fn current_roles(&self, user_id: UserId) -> Result<HashSet<RoleId>> {
        Ok(self.member(user_id).await?.roles.into_iter().collect())
    }
    async fn set_nickname(&self, user_id: UserId, nickname: Option<&str>) -> Result<()> {
        self.edit(user_id, nickname_edit(nickname)).await
    }
    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        self.ctx.http.add_member_role(self.guild_id.0, user_id.0, role_id.0, Some(AUDIT_REASON)).await
            .map_err(|e| member_error(user_id, e))
    }
    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        self.ctx.http.remove_member_role(self.guild_id.0, user_id.0, role_id.0, Some(AUDIT_REASON)).await
            .map_err(|e| member_error(user_id, e))
    }
    async fn set_roles(&self, user_id: UserId, roles: &HashSet<RoleId>) -> Result<()> {
        self.edit(user_id, roles_edit(roles)).await
    }
}
