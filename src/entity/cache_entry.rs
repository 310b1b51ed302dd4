//! Cache entry entity model for Sea-ORM database interaction.
//!
//! Backs [`DbCache`](crate::cache::DbCache), the database-resident key/value
//! store used for conversation sessions, compact profiles and cookie sessions.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one cached value.
///
/// # Database Schema
///
/// | Column      | Type               | Description                       |
/// |-------------|--------------------|-----------------------------------|
/// | id          | TEXT (Primary Key) | Cache key, e.g. `agentsession:42` |
/// | data        | BYTEA / BLOB       | Opaque payload                    |
/// | expiry_date | TIMESTAMPTZ        | Absolute expiration timestamp     |
///
/// Rows past `expiry_date` are invisible to reads and removed by
/// [`DbCache::purge_expired`](crate::cache::CacheStore::purge_expired).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cache_entry")]
pub struct Model {
    /// The cache key.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// The stored payload. Never interpreted by the cache.
    pub data: Vec<u8>,

    /// When the entry stops being served.
    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
