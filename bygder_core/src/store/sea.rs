use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{sea_query::OnConflict, DatabaseConnection};

use super::{CommentLikeStore, CommentStore, CommunityStore, MembershipStore, ProfileLookup};
use crate::{
    comments::{collect_descendant_ids, Comment, CommentLike, NewComment, Profile},
    entity::prelude::*,
    error::StoreError,
    ids::{CommentId, CommunityId, PostId, UserId},
    roles::{Community, ExplicitRole, Membership},
};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

impl TryFrom<CommentModel> for Comment {
    type Error = StoreError;

    fn try_from(model: CommentModel) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: model.id,
            post_id: model.post_id,
            parent_id: model.parent_id,
            author_id: model.author_id,
            content: model.content,
            created_at: parse_time(&model.created_at)?,
            profile: None,
        })
    }
}

impl TryFrom<CommunityMemberModel> for Membership {
    type Error = StoreError;

    fn try_from(model: CommunityMemberModel) -> Result<Self, Self::Error> {
        Ok(Membership {
            community_id: model.community_id,
            user_id: model.user_id,
            joined_at: parse_time(&model.joined_at)?,
        })
    }
}

impl TryFrom<CommunityModel> for Community {
    type Error = StoreError;

    fn try_from(model: CommunityModel) -> Result<Self, Self::Error> {
        Ok(Community {
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            created_at: parse_time(&model.created_at)?,
        })
    }
}

fn explicit_role(model: &CommunityRoleModel) -> Option<ExplicitRole> {
    let role = ExplicitRole::parse(&model.role);
    if role.is_none() {
        tracing::warn!(role = %model.role, user = %model.user_id, "ignoring unknown role row");
    }
    role
}

/// Every collaborator trait over one sea-orm connection.
#[derive(Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates a community owned by `owner`. The owner is not added as a
    /// member; ownership alone grants the owner role.
    pub async fn create_community(
        &self,
        name: String,
        owner: UserId,
    ) -> Result<Community, StoreError> {
        let model = CommunityEntity::insert(CommunityActiveModel {
            id: Set(CommunityId::new()),
            name: Set(name),
            created_by: Set(owner),
            created_at: Set(now()),
        })
        .exec_with_returning(&self.db)
        .await?;

        model.try_into()
    }

    pub async fn upsert_profile(&self, user: UserId, profile: Profile) -> Result<(), StoreError> {
        ProfileEntity::insert(ProfileActiveModel {
            id: Set(user),
            display_name: Set(profile.display_name),
            avatar_url: Set(profile.avatar_url),
        })
        .on_conflict(
            OnConflict::column(ProfileColumn::Id)
                .update_columns([ProfileColumn::DisplayName, ProfileColumn::AvatarUrl])
                .to_owned(),
        )
        .exec(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for SeaStore {
    async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StoreError> {
        let rows = CommentEntity::find()
            .filter(CommentColumn::PostId.eq(post))
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let model = CommentEntity::insert(CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(comment.post_id),
            parent_id: Set(comment.parent_id),
            author_id: Set(comment.author_id),
            content: Set(comment.content),
            created_at: Set(now()),
        })
        .exec_with_returning(&self.db)
        .await?;

        tracing::debug!(comment = %model.id, post = %model.post_id, "comment created");
        model.try_into()
    }

    /// Deletes the comment and all of its replies in one transaction.
    /// A comment that is already gone is not an error.
    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let Some(target) = CommentEntity::find_by_id(id).one(&txn).await? else {
            txn.commit().await?;
            return Ok(());
        };

        let siblings = CommentEntity::find()
            .filter(CommentColumn::PostId.eq(target.post_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let doomed: Vec<CommentId> = collect_descendant_ids(id, &siblings).into_iter().collect();

        CommentLikeEntity::delete_many()
            .filter(CommentLikeColumn::CommentId.is_in(doomed.iter().copied()))
            .exec(&txn)
            .await?;
        CommentEntity::delete_many()
            .filter(CommentColumn::Id.is_in(doomed.iter().copied()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::debug!(comment = %id, removed = doomed.len(), "comment thread deleted");
        Ok(())
    }
}

#[async_trait]
impl CommentLikeStore for SeaStore {
    async fn list_likes(&self, comments: &[CommentId]) -> Result<Vec<CommentLike>, StoreError> {
        if comments.is_empty() {
            return Ok(Vec::new());
        }
        let rows = CommentLikeEntity::find()
            .filter(CommentLikeColumn::CommentId.is_in(comments.iter().copied()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CommentLike {
                comment_id: row.comment_id,
                user_id: row.user_id,
            })
            .collect())
    }

    async fn add_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError> {
        let exists = CommentLikeEntity::find_by_id((comment, user))
            .one(&self.db)
            .await?
            .is_some();
        if !exists {
            CommentLikeEntity::insert(CommentLikeActiveModel {
                comment_id: Set(comment),
                user_id: Set(user),
            })
            .exec(&self.db)
            .await?;
        }
        Ok(())
    }

    async fn remove_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError> {
        CommentLikeEntity::delete_by_id((comment, user))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for SeaStore {
    async fn list_members(&self, community: CommunityId) -> Result<Vec<Membership>, StoreError> {
        let rows = CommunityMember::find()
            .filter(CommunityMemberColumn::CommunityId.eq(community))
            .order_by_asc(CommunityMemberColumn::JoinedAt)
            .all(&self.db)
            .await?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn is_member(&self, community: CommunityId, user: UserId) -> Result<bool, StoreError> {
        Ok(CommunityMember::find_by_id((community, user))
            .one(&self.db)
            .await?
            .is_some())
    }

    async fn get_explicit_role(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Option<ExplicitRole>, StoreError> {
        let row = CommunityRole::find_by_id((community, user))
            .one(&self.db)
            .await?;
        Ok(row.as_ref().and_then(explicit_role))
    }

    async fn list_explicit_roles(
        &self,
        community: CommunityId,
    ) -> Result<HashMap<UserId, ExplicitRole>, StoreError> {
        let rows = CommunityRole::find()
            .filter(CommunityRoleColumn::CommunityId.eq(community))
            .all(&self.db)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| explicit_role(row).map(|role| (row.user_id, role)))
            .collect())
    }

    async fn upsert_moderator_role(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<(), StoreError> {
        CommunityRole::insert(CommunityRoleActiveModel {
            community_id: Set(community),
            user_id: Set(user),
            role: Set(ExplicitRole::Moderator.as_str().to_string()),
        })
        .on_conflict(
            OnConflict::columns([CommunityRoleColumn::CommunityId, CommunityRoleColumn::UserId])
                .update_column(CommunityRoleColumn::Role)
                .to_owned(),
        )
        .exec(&self.db)
        .await?;
        Ok(())
    }

    async fn remove_role(&self, community: CommunityId, user: UserId) -> Result<(), StoreError> {
        CommunityRole::delete_by_id((community, user))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn add_membership(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Membership, StoreError> {
        if let Some(existing) = CommunityMember::find_by_id((community, user))
            .one(&self.db)
            .await?
        {
            return existing.try_into();
        }

        let model = CommunityMember::insert(CommunityMemberActiveModel {
            community_id: Set(community),
            user_id: Set(user),
            joined_at: Set(now()),
        })
        .exec_with_returning(&self.db)
        .await?;

        model.try_into()
    }

    async fn remove_membership(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<(), StoreError> {
        CommunityMember::delete_by_id((community, user))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileLookup for SeaStore {
    async fn get_profiles(&self, users: &[UserId]) -> Result<HashMap<UserId, Profile>, StoreError> {
        if users.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = ProfileEntity::find()
            .filter(ProfileColumn::Id.is_in(users.iter().copied()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let profile = Profile {
                    display_name: row.display_name,
                    avatar_url: row.avatar_url,
                };
                (row.id, profile)
            })
            .collect())
    }
}

#[async_trait]
impl CommunityStore for SeaStore {
    async fn get_community(&self, id: CommunityId) -> Result<Community, StoreError> {
        CommunityEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("community"))?
            .try_into()
    }
}
