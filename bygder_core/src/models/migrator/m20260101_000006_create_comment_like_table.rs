use sea_orm_migration::{prelude::*, schema::*};

use super::m20260101_000005_create_comment_table::Comment;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommentLike::Table)
                    .col(uuid(CommentLike::CommentId))
                    .col(uuid(CommentLike::UserId))
                    .primary_key(
                        Index::create()
                            .col(CommentLike::CommentId)
                            .col(CommentLike::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-comment-like-comment_id")
                            .from(CommentLike::Table, CommentLike::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentLike::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CommentLike {
    Table,
    CommentId,
    UserId,
}
