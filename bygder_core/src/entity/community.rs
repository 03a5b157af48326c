use crate::ids::{CommunityId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: CommunityId,
    pub name: String,
    pub created_by: UserId,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::community_member::Entity")]
    CommunityMember,
    #[sea_orm(has_many = "super::community_role::Entity")]
    CommunityRole,
}

impl Related<super::community_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommunityMember.def()
    }
}

impl Related<super::community_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommunityRole.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
