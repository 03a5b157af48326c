use sea_orm_migration::prelude::*;

mod m20260101_000001_create_profile_table;
mod m20260101_000002_create_community_table;
mod m20260101_000003_create_community_member_table;
mod m20260101_000004_create_community_role_table;
mod m20260101_000005_create_comment_table;
mod m20260101_000006_create_comment_like_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_profile_table::Migration),
            Box::new(m20260101_000002_create_community_table::Migration),
            Box::new(m20260101_000003_create_community_member_table::Migration),
            Box::new(m20260101_000004_create_community_role_table::Migration),
            Box::new(m20260101_000005_create_comment_table::Migration),
            Box::new(m20260101_000006_create_comment_like_table::Migration),
        ]
    }
}
