use sea_orm_migration::{prelude::*, schema::*};

use super::m20260101_000002_create_community_table::Community;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommunityMember::Table)
                    .col(uuid(CommunityMember::CommunityId))
                    .col(uuid(CommunityMember::UserId))
                    .col(string(CommunityMember::JoinedAt))
                    .primary_key(
                        Index::create()
                            .col(CommunityMember::CommunityId)
                            .col(CommunityMember::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-community-member-community_id")
                            .from(CommunityMember::Table, CommunityMember::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_community_member_user_id")
                    .table(CommunityMember::Table)
                    .col(CommunityMember::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CommunityMember {
    Table,
    CommunityId,
    UserId,
    JoinedAt,
}
