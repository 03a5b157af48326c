//! Collaborators the core is handed rather than owning: the hosted
//! comment, membership and profile data. [`sea::SeaStore`] implements all of
//! them over a sea-orm connection.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    comments::{Comment, CommentLike, NewComment, Profile},
    error::StoreError,
    ids::{CommentId, CommunityId, PostId, UserId},
    roles::{Community, ExplicitRole, Membership},
};

pub mod sea;

pub use sea::SeaStore;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All comments of one post, in any order.
    async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StoreError>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CommentLikeStore: Send + Sync {
    async fn list_likes(&self, comments: &[CommentId]) -> Result<Vec<CommentLike>, StoreError>;

    async fn add_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError>;

    async fn remove_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Members ordered by join time.
    async fn list_members(&self, community: CommunityId) -> Result<Vec<Membership>, StoreError>;

    async fn is_member(&self, community: CommunityId, user: UserId) -> Result<bool, StoreError>;

    async fn get_explicit_role(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Option<ExplicitRole>, StoreError>;

    /// Role rows for every user of `community` that has one.
    async fn list_explicit_roles(
        &self,
        community: CommunityId,
    ) -> Result<HashMap<UserId, ExplicitRole>, StoreError>;

    async fn upsert_moderator_role(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<(), StoreError>;

    async fn remove_role(&self, community: CommunityId, user: UserId) -> Result<(), StoreError>;

    async fn add_membership(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Membership, StoreError>;

    async fn remove_membership(&self, community: CommunityId, user: UserId)
        -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Users without a profile are simply absent from the map.
    async fn get_profiles(&self, users: &[UserId]) -> Result<HashMap<UserId, Profile>, StoreError>;
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn get_community(&self, id: CommunityId) -> Result<Community, StoreError>;
}
