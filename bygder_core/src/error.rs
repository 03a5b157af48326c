use sea_orm::DbErr;
use thiserror::Error;

/// A call to an external collaborator failed (network, auth, or policy
/// denial on the backend side). Never retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data store unavailable")]
    Db(#[from] DbErr),

    #[error("stored timestamp could not be read")]
    Timestamp(#[from] chrono::ParseError),

    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Reasons the moderation gate rejects an action. Checked before any
/// mutation reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("only the owner may do this")]
    NotOwner,

    #[error("the target is not a plain member")]
    TargetNotMember,

    #[error("the target is not a moderator")]
    TargetNotModerator,

    #[error("the owner of a community cannot be removed or demoted")]
    TargetIsOwner,

    #[error("you cannot moderate yourself")]
    TargetIsSelf,

    #[error("only the owner may remove another moderator")]
    ModeratorTarget,

    #[error("only the author or a moderator may delete this")]
    NotAuthorOrModerator,

    #[error("moderator rights are required")]
    CannotModerate,

    #[error("the owner cannot leave their own community")]
    OwnerCannotLeave,
}

#[derive(Debug, Error)]
pub enum BygderError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Denied(#[from] Denied),

    #[error("another action is already in progress")]
    Busy,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("content cannot be empty")]
    EmptyContent,
}

impl BygderError {
    /// The one line shown to the user for a failed action.
    pub fn user_message(&self) -> String {
        match self {
            BygderError::Store(err) => format!("Could not reach the server: {err}"),
            BygderError::Denied(reason) => format!("Not allowed: {reason}"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_single_line() {
        let errors = [
            BygderError::from(StoreError::NotFound("comment")),
            BygderError::from(Denied::ModeratorTarget),
            BygderError::Busy,
            BygderError::EmptyContent,
        ];
        for err in errors {
            let message = err.user_message();
            assert!(!message.is_empty());
            assert!(!message.contains('\n'));
        }
    }

    #[test]
    fn test_denied_message() {
        let err = BygderError::from(Denied::TargetIsOwner);
        assert_eq!(
            err.user_message(),
            "Not allowed: the owner of a community cannot be removed or demoted"
        );
    }
}
