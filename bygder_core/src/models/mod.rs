use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::config::BygderConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &BygderConfig) -> Result<DatabaseConnection, DbErr> {
    let url = config.database_url();
    tracing::debug!(%url, "opening database");
    Database::connect(&url).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[tokio::test]
    async fn test_open_and_migrate_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let config = config::load_or_init_at(dir.path()).await.unwrap();

        let db = open_or_create_db(&config).await.unwrap();
        migrate_up(&db).await.unwrap();
        // running twice is a no-op
        migrate_up(&db).await.unwrap();

        assert!(config.database_path.exists());
    }
}
