use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Application state flags, e.g. whether the hardware catalog has been seeded.
        // 191 characters keeps the primary key within MySQL's utf8mb4 index limit.
        manager.create_table(settings_table()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

fn settings_table() -> TableCreateStatement {
    Table::create()
        .table(Settings::Table)
        .if_not_exists()
        .col(string_len(Settings::Key, 191).primary_key())
        .col(string_len_null(Settings::Value, 1000))
        .to_owned()
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Key,
    Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_a_bounded_primary_key() {
        let sql = settings_table().to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""key" varchar(191) NOT NULL PRIMARY KEY"#), "{sql}");
        assert!(sql.contains(r#""value" varchar(1000)"#), "{sql}");
    }

    #[test]
    fn value_is_nullable_on_mysql() {
        let sql = settings_table().to_string(MysqlQueryBuilder);
        assert!(sql.contains("`value` varchar(1000) NULL"), "{sql}");
    }
}
