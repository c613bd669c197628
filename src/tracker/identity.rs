use std::collections::HashSet;
use serenity::{async_trait, model::id::{RoleId, UserId}};
use crate::error::Result;

/// Access to the identity of the members: nickname and roles.
///
/// Every call may fail. [`Error::MissingMember`] is returned when the member
/// cannot be resolved, [`Error::ExternalCall`] for any other failure.
///
/// [`Error::MissingMember`]: crate::error::Error::MissingMember
/// [`Error::ExternalCall`]: crate::error::Error::ExternalCall
#[async_trait]
pub trait IdentityService: Send + Sync + 'static {
    async fn current_nickname(&self, user_id: UserId) -> Result<Option<String>>;
    async fn current_roles(&self, user_id: UserId) -> Result<HashSet<RoleId>>;
    /// Set the nickname of the member. `None` clears it.
    async fn set_nickname(&self, user_id: UserId, nickname: Option<&str>) -> Result<()>;
    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> Result<()>;
    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<()>;
    /// Replace the whole role set of the member.
    async fn set_roles(&self, user_id: UserId, roles: &HashSet<RoleId>) -> Result<()>;
}
