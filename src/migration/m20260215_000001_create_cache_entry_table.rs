use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CacheEntry::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(CacheEntry::Data).blob().not_null())
                    .col(
                        ColumnDef::new(CacheEntry::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Purges scan by expiry
        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entry_expiry_date")
                    .table(CacheEntry::Table)
                    .col(CacheEntry::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CacheEntry::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CacheEntry {
    Table,
    Id,
    Data,
    ExpiryDate,
}
