pub use sea_orm_migration::prelude::*;

mod m20260215_000001_create_cache_entry_table;
mod m20260215_000002_create_user_profile_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Keep our bookkeeping apart from any other migrator sharing the database
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("folio_chat_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260215_000001_create_cache_entry_table::Migration),
            Box::new(m20260215_000002_create_user_profile_table::Migration),
        ]
    }
}
