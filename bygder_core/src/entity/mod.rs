// SeaORM entities backing the reference store adapter

pub mod comment;
pub mod comment_like;
pub mod community;
pub mod community_member;
pub mod community_role;
pub mod profile;


pub mod prelude {
    pub use super::comment::{
        ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as CommentEntity,
        Model as CommentModel,
    };
    pub use super::comment_like::{
        ActiveModel as CommentLikeActiveModel, Column as CommentLikeColumn,
        Entity as CommentLikeEntity, Model as CommentLikeModel,
    };
    pub use super::community::{
        ActiveModel as CommunityActiveModel, Column as CommunityColumn,
        Entity as CommunityEntity, Model as CommunityModel,
    };
    pub use super::community_member::{
        ActiveModel as CommunityMemberActiveModel, Column as CommunityMemberColumn,
        Entity as CommunityMember, Model as CommunityMemberModel,
    };
    pub use super::community_role::{
        ActiveModel as CommunityRoleActiveModel, Column as CommunityRoleColumn,
        Entity as CommunityRole, Model as CommunityRoleModel,
    };
    pub use super::profile::{
        ActiveModel as ProfileActiveModel, Column as ProfileColumn, Entity as ProfileEntity,
        Model as ProfileModel,
    };

    pub use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    };
}
