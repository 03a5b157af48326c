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
                    .table(CommunityRole::Table)
                    .col(uuid(CommunityRole::CommunityId))
                    .col(uuid(CommunityRole::UserId))
                    .col(string(CommunityRole::Role))
                    .primary_key(
                        Index::create()
                            .col(CommunityRole::CommunityId)
                            .col(CommunityRole::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-community-role-community_id")
                            .from(CommunityRole::Table, CommunityRole::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityRole::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CommunityRole {
    Table,
    CommunityId,
    UserId,
    Role,
}
