use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    authorize, can_moderate, resolve_role, resolve_role_from_store, Actor, Community,
    MemberCapabilities, Membership, ModerationAction, Role, Target,
};
use crate::{
    actions::{ActionState, ActionTracker},
    comments::Profile,
    error::{BygderError, Denied, StoreError},
    ids::UserId,
    store::{MembershipStore, ProfileLookup},
};

/// One row of the member list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    pub role: Role,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Member {
    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.display_name.as_str())
    }

    fn as_target(&self, community: &Community) -> Target {
        Target {
            user: self.user_id,
            role: self.role,
            is_owner: community.is_owner(self.user_id),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub total: usize,
    pub moderators: usize,
    pub owners: usize,
}

/// Members of one community with their effective roles, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    community: Community,
    members: Vec<Member>,
}

impl Roster {
    pub async fn load<S>(store: &S, community: &Community) -> Result<Self, StoreError>
    where
        S: MembershipStore + ProfileLookup + ?Sized,
    {
        let mut rows = store.list_members(community.id).await?;
        rows.sort_by_key(|m| m.joined_at);

        let roles = store
            .list_explicit_roles(community.id)
            .await
            .inspect_err(|err| {
                tracing::warn!(?err, community = %community.id, "role lookup failed, listing everyone as member")
            })
            .unwrap_or_default();

        let users: Vec<UserId> = rows.iter().map(|m| m.user_id).collect();
        let mut profiles = if users.is_empty() {
            Default::default()
        } else {
            store
                .get_profiles(&users)
                .await
                .inspect_err(|err| tracing::warn!(?err, "could not fetch member profiles"))
                .unwrap_or_default()
        };

        let members = rows
            .into_iter()
            .map(|Membership { user_id, joined_at, .. }| Member {
                user_id,
                joined_at,
                role: resolve_role(community, user_id, true, |_, user| {
                    Ok(roles.get(&user).copied())
                }),
                profile: profiles.remove(&user_id),
            })
            .collect::<Vec<_>>();

        tracing::debug!(community = %community.id, members = members.len(), "roster loaded");
        Ok(Self {
            community: community.clone(),
            members,
        })
    }

    /// A roster with no members, for actors who may not see the list.
    pub fn empty(community: &Community) -> Self {
        Self {
            community: community.clone(),
            members: Vec::new(),
        }
    }

    pub fn community(&self) -> &Community {
        &self.community
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, user: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user)
    }

    pub fn summary(&self) -> RosterSummary {
        let count = |role| self.members.iter().filter(|m| m.role == role).count();
        RosterSummary {
            total: self.members.len(),
            moderators: count(Role::Moderator),
            owners: count(Role::Owner),
        }
    }

    /// Moderation actions `actor` may take against `user`. Nothing for users
    /// outside the roster.
    pub fn capabilities(&self, actor: &Actor, user: UserId) -> MemberCapabilities {
        self.get(user)
            .map(|m| MemberCapabilities::for_target(actor, &m.as_target(&self.community)))
            .unwrap_or_default()
    }

    fn target(&self, user: UserId) -> Result<Target, BygderError> {
        self.get(user)
            .map(|m| m.as_target(&self.community))
            .ok_or(BygderError::NotFound("member"))
    }

    fn set_role(&mut self, user: UserId, role: Role) {
        if let Some(member) = self.members.iter_mut().find(|m| m.user_id == user) {
            member.role = role;
        }
    }

    fn drop_member(&mut self, user: UserId) {
        self.members.retain(|m| m.user_id != user);
    }
}

/// `guest -> member`.
pub async fn join<S>(store: &S, community: &Community, user: UserId) -> Result<Membership, BygderError>
where
    S: MembershipStore + ?Sized,
{
    let membership = store
        .add_membership(community.id, user)
        .await
        .inspect_err(|err| tracing::error!(?err, community = %community.id, %user, "failed to join"))?;
    tracing::debug!(community = %community.id, %user, "joined community");
    Ok(membership)
}

/// `member | moderator -> guest`. Drops the role row too, so a later
/// join starts over as a plain member.
pub async fn leave<S>(store: &S, community: &Community, user: UserId) -> Result<(), BygderError>
where
    S: MembershipStore + ?Sized,
{
    if community.is_owner(user) {
        return Err(Denied::OwnerCannotLeave.into());
    }
    drop_membership(store, community, user)
        .await
        .inspect_err(|err| tracing::error!(?err, community = %community.id, %user, "failed to leave"))?;
    tracing::debug!(community = %community.id, %user, "left community");
    Ok(())
}

async fn drop_membership<S>(store: &S, community: &Community, user: UserId) -> Result<(), StoreError>
where
    S: MembershipStore + ?Sized,
{
    store.remove_membership(community.id, user).await?;
    store.remove_role(community.id, user).await
}

/// Member management for one community as seen by one actor.
pub struct Moderation<S> {
    store: S,
    actor: Actor,
    roster: Roster,
    actions: ActionTracker<UserId>,
}

impl<S: MembershipStore + ProfileLookup> Moderation<S> {
    /// Resolves the actor's role and reads the roster. Only owners and
    /// moderators get the member list; everyone else sees an empty one.
    pub async fn open(store: S, community: &Community, user: UserId) -> Result<Self, BygderError> {
        let role = resolve_role_from_store(&store, community, user).await?;
        let roster = if can_moderate(role) {
            Roster::load(&store, community).await?
        } else {
            Roster::empty(community)
        };
        Ok(Self {
            store,
            actor: Actor { user, role },
            roster,
            actions: ActionTracker::default(),
        })
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn state(&self, user: UserId) -> ActionState {
        self.actions.state(user)
    }

    pub fn capabilities(&self, user: UserId) -> MemberCapabilities {
        self.roster.capabilities(&self.actor, user)
    }

    pub async fn promote(&mut self, user: UserId) -> Result<(), BygderError> {
        self.moderate(ModerationAction::Promote, user).await
    }

    pub async fn demote(&mut self, user: UserId) -> Result<(), BygderError> {
        self.moderate(ModerationAction::Demote, user).await
    }

    /// Removes membership first, then the role row.
    pub async fn remove(&mut self, user: UserId) -> Result<(), BygderError> {
        self.moderate(ModerationAction::Remove, user).await
    }

    async fn moderate(&mut self, action: ModerationAction, user: UserId) -> Result<(), BygderError> {
        if !can_moderate(self.actor.role) {
            return Err(Denied::CannotModerate.into());
        }
        let target = self.roster.target(user)?;
        authorize(action, &self.actor, &target)?;
        self.actions.begin(user)?;

        let community = self.roster.community.id;
        let outcome = match action {
            ModerationAction::Promote => self.store.upsert_moderator_role(community, user).await,
            ModerationAction::Demote => self.store.remove_role(community, user).await,
            ModerationAction::Remove => {
                drop_membership(&self.store, &self.roster.community, user).await
            }
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(?action, %community, %user, "moderation applied");
                match action {
                    ModerationAction::Promote => self.roster.set_role(user, Role::Moderator),
                    ModerationAction::Demote => self.roster.set_role(user, Role::Member),
                    ModerationAction::Remove => self.roster.drop_member(user),
                }
                self.reload().await;
                self.actions.finish(user, Ok(()))
            }
            Err(err) => {
                tracing::error!(?err, ?action, %community, %user, "moderation failed");
                self.actions.finish(user, Err(err.into()))
            }
        }
    }

    /// Re-reads the roster. The local copy stays as it is if that fails.
    pub async fn reload(&mut self) {
        if !can_moderate(self.actor.role) {
            self.roster = Roster::empty(&self.roster.community);
            return;
        }
        match Roster::load(&self.store, &self.roster.community).await {
            Ok(roster) => self.roster = roster,
            Err(err) => tracing::warn!(?err, "could not refresh roster"),
        }
    }

    /// The actor joins the community.
    pub async fn join(&mut self) -> Result<(), BygderError> {
        join(&self.store, &self.roster.community, self.actor.user).await?;
        self.refresh_actor().await
    }

    /// The actor leaves the community.
    pub async fn leave(&mut self) -> Result<(), BygderError> {
        leave(&self.store, &self.roster.community, self.actor.user).await?;
        self.refresh_actor().await
    }

    async fn refresh_actor(&mut self) -> Result<(), BygderError> {
        self.actor.role =
            resolve_role_from_store(&self.store, &self.roster.community, self.actor.user).await?;
        self.reload().await;
        Ok(())
    }
}
