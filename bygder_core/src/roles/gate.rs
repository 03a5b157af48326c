use super::{can_moderate, Role};
use crate::{error::Denied, ids::UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub role: Role,
}

/// The member a moderation action is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub user: UserId,
    pub role: Role,
    /// Community ownership, independent of what `role` says.
    pub is_owner: bool,
}

impl Target {
    fn is_owner(&self) -> bool {
        self.is_owner || self.role == Role::Owner
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    /// member -> moderator
    Promote,
    /// moderator -> member
    Demote,
    /// member|moderator -> guest
    Remove,
}

pub fn authorize(action: ModerationAction, actor: &Actor, target: &Target) -> Result<(), Denied> {
    if target.is_owner() {
        return Err(Denied::TargetIsOwner);
    }
    match action {
        ModerationAction::Promote => {
            if actor.role != Role::Owner {
                return Err(Denied::NotOwner);
            }
            if target.role != Role::Member {
                return Err(Denied::TargetNotMember);
            }
            Ok(())
        }
        ModerationAction::Demote => {
            if actor.role != Role::Owner {
                return Err(Denied::NotOwner);
            }
            if target.role != Role::Moderator {
                return Err(Denied::TargetNotModerator);
            }
            Ok(())
        }
        ModerationAction::Remove => {
            if target.user == actor.user {
                return Err(Denied::TargetIsSelf);
            }
            match (actor.role, target.role) {
                (Role::Owner, _) => Ok(()),
                (Role::Moderator, Role::Member) => Ok(()),
                (Role::Moderator, _) => Err(Denied::ModeratorTarget),
                _ => Err(Denied::CannotModerate),
            }
        }
    }
}

/// Authors may always delete their own posts and comments; anyone else
/// needs moderator rights.
pub fn authorize_delete(actor: &Actor, author: UserId) -> Result<(), Denied> {
    if actor.user == author || can_moderate(actor.role) {
        Ok(())
    } else {
        Err(Denied::NotAuthorOrModerator)
    }
}

/// Which moderation buttons to offer for one member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberCapabilities {
    pub promote: bool,
    pub demote: bool,
    pub remove: bool,
}

impl MemberCapabilities {
    pub fn for_target(actor: &Actor, target: &Target) -> Self {
        Self {
            promote: authorize(ModerationAction::Promote, actor, target).is_ok(),
            demote: authorize(ModerationAction::Demote, actor, target).is_ok(),
            remove: authorize(ModerationAction::Remove, actor, target).is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::fixtures::uid;

    fn actor(seed: u128, role: Role) -> Actor {
        Actor {
            user: uid(seed),
            role,
        }
    }

    fn target(seed: u128, role: Role) -> Target {
        Target {
            user: uid(seed),
            role,
            is_owner: role == Role::Owner,
        }
    }

    use ModerationAction::*;

    #[test]
    fn test_owner_promotes_and_demotes() {
        let owner = actor(1, Role::Owner);
        assert_eq!(authorize(Promote, &owner, &target(2, Role::Member)), Ok(()));
        assert_eq!(authorize(Demote, &owner, &target(2, Role::Moderator)), Ok(()));
        assert_eq!(
            authorize(Promote, &owner, &target(2, Role::Moderator)),
            Err(Denied::TargetNotMember)
        );
        assert_eq!(
            authorize(Demote, &owner, &target(2, Role::Member)),
            Err(Denied::TargetNotModerator)
        );
    }

    #[test]
    fn test_moderator_cannot_change_roles() {
        let moderator = actor(1, Role::Moderator);
        assert_eq!(
            authorize(Promote, &moderator, &target(2, Role::Member)),
            Err(Denied::NotOwner)
        );
        assert_eq!(
            authorize(Demote, &moderator, &target(2, Role::Moderator)),
            Err(Denied::NotOwner)
        );
    }

    #[test]
    fn test_remove_rules() {
        let owner = actor(1, Role::Owner);
        let moderator = actor(2, Role::Moderator);
        let member = actor(3, Role::Member);

        assert_eq!(authorize(Remove, &owner, &target(4, Role::Moderator)), Ok(()));
        assert_eq!(authorize(Remove, &moderator, &target(4, Role::Member)), Ok(()));
        assert_eq!(
            authorize(Remove, &moderator, &target(4, Role::Moderator)),
            Err(Denied::ModeratorTarget)
        );
        assert_eq!(
            authorize(Remove, &member, &target(4, Role::Member)),
            Err(Denied::CannotModerate)
        );
        assert_eq!(
            authorize(Remove, &moderator, &target(2, Role::Moderator)),
            Err(Denied::TargetIsSelf)
        );
    }

    #[test]
    fn test_owner_is_untouchable() {
        let owner = actor(1, Role::Owner);
        let moderator = actor(2, Role::Moderator);
        let owner_target = target(1, Role::Owner);

        for action in [Promote, Demote, Remove] {
            assert_eq!(authorize(action, &owner, &owner_target), Err(Denied::TargetIsOwner));
            assert_eq!(authorize(action, &moderator, &owner_target), Err(Denied::TargetIsOwner));
        }

        // ownership flag alone is enough, whatever the role table says
        let disguised = Target {
            user: uid(1),
            role: Role::Moderator,
            is_owner: true,
        };
        assert_eq!(authorize(Demote, &owner, &disguised), Err(Denied::TargetIsOwner));
    }

    #[test]
    fn test_delete_own_content_without_membership() {
        let guest = actor(5, Role::Guest);
        assert_eq!(authorize_delete(&guest, uid(5)), Ok(()));
        assert_eq!(authorize_delete(&guest, uid(6)), Err(Denied::NotAuthorOrModerator));
        assert_eq!(authorize_delete(&actor(1, Role::Moderator), uid(6)), Ok(()));
        assert_eq!(
            authorize_delete(&actor(3, Role::Member), uid(6)),
            Err(Denied::NotAuthorOrModerator)
        );
    }

    #[test]
    fn test_capabilities() {
        let owner = actor(1, Role::Owner);
        let caps = MemberCapabilities::for_target(&owner, &target(2, Role::Member));
        assert_eq!(
            caps,
            MemberCapabilities {
                promote: true,
                demote: false,
                remove: true
            }
        );
        assert_eq!(
            MemberCapabilities::for_target(&actor(3, Role::Moderator), &target(2, Role::Moderator)),
            MemberCapabilities::default()
        );
    }
}
