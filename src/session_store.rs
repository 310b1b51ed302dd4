use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};

use crate::cache::{CacheError, CacheStore};

/// A `tower-sessions` store that keeps cookie sessions in a [`CacheStore`].
///
/// Cookie sessions only carry the authenticated identity handed over by the
/// identity provider, so they live next to the conversation sessions instead
/// of in a table of their own.
///
/// Records are serialized with MessagePack and stored under
/// `httpsession:{id}`. The cache entry expires together with the record.
///
/// # Error Handling
///
/// - Cache failures → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct CacheSessionStore {
    cache: Arc<dyn CacheStore>,
}

impl CacheSessionStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    fn key(id: &Id) -> String {
        format!("httpsession:{id}")
    }
}

#[async_trait]
impl SessionStore for CacheSessionStore {
    /// Creates a new session record.
    ///
    /// If the generated ID is already taken a new one is drawn until a free
    /// one is found.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        // Session ID collision mitigation
        while self
            .cache
            .get(&Self::key(&record.id))
            .await
            .map_err(backend)?
            .is_some()
        {
            record.id = Id::default();
        }

        self.save(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        self.cache
            .set(&Self::key(&record.id), &data, ttl_until(record.expiry_date))
            .await
            .map_err(backend)
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        match self.cache.get(&Self::key(session_id)).await.map_err(backend)? {
            Some(data) => {
                let record = rmp_serde::from_slice(&data)
                    .map_err(|e| session_store::Error::Decode(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache
            .remove(&Self::key(session_id))
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl ExpiredDeletion for CacheSessionStore {
    /// Purges every expired cache entry, cookie sessions included.
    async fn delete_expired(&self) -> session_store::Result<()> {
        self.cache.purge_expired().await.map_err(backend)?;
        Ok(())
    }
}

fn backend(e: CacheError) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

// Records already past their expiry get a zero TTL and are never served
fn ttl_until(expiry_date: OffsetDateTime) -> Duration {
    let remaining = (expiry_date - OffsetDateTime::now_utc()).whole_seconds();
    Duration::from_secs(remaining.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::cache::MemoryCache;

    fn record(expires_in: time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::from([("user_id".to_string(), serde_json::json!("alice"))]),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn saved_record_loads_back() {
        let store = CacheSessionStore::new(Arc::new(MemoryCache::new()));
        let mut rec = record(time::Duration::hours(1));
        store.create(&mut rec).await.unwrap();

        let loaded = store.load(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, rec.data);
        assert_eq!(loaded.id, rec.id);
    }

    #[tokio::test]
    async fn deleted_record_is_gone() {
        let store = CacheSessionStore::new(Arc::new(MemoryCache::new()));
        let mut rec = record(time::Duration::hours(1));
        store.create(&mut rec).await.unwrap();
        store.delete(&rec.id).await.unwrap();

        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_record_is_not_served() {
        let store = CacheSessionStore::new(Arc::new(MemoryCache::new()));
        let rec = record(time::Duration::hours(-1));
        store.save(&rec).await.unwrap();

        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_payload_is_a_decode_error() {
        let cache = Arc::new(MemoryCache::new());
        let store = CacheSessionStore::new(cache.clone());
        let id = Id::default();
        cache
            .set(&CacheSessionStore::key(&id), b"not msgpack", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(matches!(
            store.load(&id).await,
            Err(session_store::Error::Decode(_))
        ));
    }
}
