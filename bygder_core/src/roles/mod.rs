//! Community roles: who owns, moderates, or merely belongs to a community,
//! and which moderation actions follow from that.
//!
//! [`resolve_role`] is the only place an effective role is derived.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    ids::{CommunityId, UserId},
    store::MembershipStore,
};

pub mod gate;
pub mod roster;

pub use gate::{authorize, authorize_delete, Actor, MemberCapabilities, ModerationAction, Target};
pub use roster::{join, leave, Member, Moderation, Roster, RosterSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Moderator,
    Member,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Moderator => "moderator",
            Role::Member => "member",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only role kept in the roles table. Owner is derived from the
/// community, member and guest from membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitRole {
    Moderator,
}

impl ExplicitRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplicitRole::Moderator => "moderator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "moderator" => Some(ExplicitRole::Moderator),
            _ => None,
        }
    }
}

impl From<ExplicitRole> for Role {
    fn from(role: ExplicitRole) -> Self {
        match role {
            ExplicitRole::Moderator => Role::Moderator,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    /// The owner. Fixed at creation and never transferred.
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn is_owner(&self, user: UserId) -> bool {
        self.created_by == user
    }
}

/// Membership row. Unique per `(community_id, user_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub community_id: CommunityId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

pub fn can_moderate(role: Role) -> bool {
    matches!(role, Role::Owner | Role::Moderator)
}

/// Effective role of `user` in `community`.
///
/// Ownership wins over everything, membership is required for any other
/// role, and a failing `explicit_role` lookup degrades to [`Role::Member`].
/// The lookup is only called for members who are not the owner.
pub fn resolve_role<F>(community: &Community, user: UserId, is_member: bool, explicit_role: F) -> Role
where
    F: FnOnce(CommunityId, UserId) -> Result<Option<ExplicitRole>, StoreError>,
{
    if community.is_owner(user) {
        return Role::Owner;
    }
    if !is_member {
        return Role::Guest;
    }
    match explicit_role(community.id, user) {
        Ok(role) => role.map(Role::from).unwrap_or(Role::Member),
        Err(err) => {
            tracing::warn!(?err, community = %community.id, %user, "role lookup failed, assuming member");
            Role::Member
        }
    }
}

/// [`resolve_role`] fed from a [`MembershipStore`]. A failing membership
/// check is surfaced; a failing role lookup is not.
pub async fn resolve_role_from_store<S>(
    store: &S,
    community: &Community,
    user: UserId,
) -> Result<Role, StoreError>
where
    S: MembershipStore + ?Sized,
{
    if community.is_owner(user) {
        return Ok(Role::Owner);
    }
    let is_member = store.is_member(community.id, user).await?;
    let explicit = if is_member {
        store.get_explicit_role(community.id, user).await
    } else {
        Ok(None)
    };
    Ok(resolve_role(community, user, is_member, |_, _| explicit))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn no_lookup(_: CommunityId, _: UserId) -> Result<Option<ExplicitRole>, StoreError> {
        panic!("role table must not be consulted");
    }

    #[test]
    fn test_owner_without_membership() {
        let owner = uid(1);
        assert_eq!(resolve_role(&community(owner), owner, false, no_lookup), Role::Owner);
    }

    #[test]
    fn test_owner_beats_explicit_role() {
        let owner = uid(1);
        let role = resolve_role(&community(owner), owner, true, |_, _| {
            Ok(Some(ExplicitRole::Moderator))
        });
        assert_eq!(role, Role::Owner);
    }

    #[test]
    fn test_non_member_is_guest() {
        assert_eq!(resolve_role(&community(uid(1)), uid(2), false, no_lookup), Role::Guest);
    }

    #[test]
    fn test_member_roles() {
        let c = community(uid(1));
        assert_eq!(resolve_role(&c, uid(2), true, |_, _| Ok(None)), Role::Member);
        assert_eq!(
            resolve_role(&c, uid(2), true, |_, _| Ok(Some(ExplicitRole::Moderator))),
            Role::Moderator
        );
    }

    #[test]
    fn test_lookup_failure_degrades_to_member() {
        let role = resolve_role(&community(uid(1)), uid(2), true, |_, _| {
            Err(StoreError::NotFound("role"))
        });
        assert_eq!(role, Role::Member);
    }

    #[test]
    fn test_can_moderate() {
        assert!(can_moderate(Role::Owner));
        assert!(can_moderate(Role::Moderator));
        assert!(!can_moderate(Role::Member));
        assert!(!can_moderate(Role::Guest));
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
        assert_eq!(ExplicitRole::parse("moderator"), Some(ExplicitRole::Moderator));
        assert_eq!(ExplicitRole::parse("owner"), None);
    }
}
