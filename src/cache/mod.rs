//! Key/value cache contract and its adapters.
//!
//! The chat flow only ever needs `get`, `set` with a TTL, and `remove`. There
//! are no transactional guarantees: concurrent writers to one key race and the
//! last write wins.

mod db_store;
mod memory;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

pub use db_store::DbCache;
pub use memory::MemoryCache;

/// How long a conversation session survives without a successful send.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long the compact profile snapshot stays cached after a profile write.
pub const PROFILE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache key holding the serialized conversation session of `user_id`.
pub fn session_key(user_id: &str) -> String {
    format!("agentsession:{user_id}")
}

/// Cache key holding the compact profile document of `user_id`.
pub fn profile_key(user_id: &str) -> String {
    format!("agentprofile:{user_id}")
}

/// Errors raised by cache adapters.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backing store failed or could not be reached.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A value could not be encoded for storage.
    #[error("cache encode error: {0}")]
    Encode(String),

    /// A stored value could not be decoded.
    #[error("cache decode error: {0}")]
    Decode(String),
}

/// A shared key/value store with per-entry expiry.
///
/// Values are opaque bytes; callers own their encoding.
#[async_trait]
pub trait CacheStore: Debug + Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value and resetting
    /// its expiry to `ttl` from now.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drops every expired entry and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, CacheError>;
}
