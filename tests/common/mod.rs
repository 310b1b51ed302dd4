#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderName, Request, StatusCode};
use axum::Router;
use folio_chat::agent::{AgentError, AgentResponse, AgentSession, ChatAgent};
use folio_chat::cache::{CacheError, CacheStore, MemoryCache};
use folio_chat::migration::Migrator;
use folio_chat::web::{self, AppState};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

pub const USER_HEADER: &str = "x-user-id";

pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replies `echo: {message}`.
    Echo,
    /// Every run fails.
    Fail,
    /// Runs never complete.
    Hang,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FakeState {
    turns: u32,
}

/// Scripted model. Sessions are `{"turns":n}` documents.
pub struct FakeAgent {
    mode: Mode,
    calls: AtomicUsize,
    last_instructions: Mutex<Option<Option<String>>>,
}

impl FakeAgent {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
            last_instructions: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instructions passed to the most recent run. Panics if nothing ran.
    pub fn last_instructions(&self) -> Option<String> {
        self.last_instructions
            .lock()
            .unwrap()
            .clone()
            .expect("agent was never run")
    }
}

#[async_trait]
impl ChatAgent for FakeAgent {
    async fn create_session(&self) -> Result<AgentSession, AgentError> {
        Ok(AgentSession::from_payload(br#"{"turns":0}"#.to_vec()))
    }

    async fn run(
        &self,
        message: &str,
        session: &mut AgentSession,
        instructions: Option<&str>,
    ) -> Result<AgentResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_instructions.lock().unwrap() = Some(instructions.map(str::to_owned));

        match self.mode {
            Mode::Echo => {
                let mut state: FakeState = serde_json::from_slice(session.payload())
                    .map_err(|e| AgentError::Session(e.to_string()))?;
                state.turns += 1;
                let payload =
                    serde_json::to_vec(&state).map_err(|e| AgentError::Session(e.to_string()))?;
                *session = AgentSession::from_payload(payload);
                Ok(AgentResponse {
                    text: Some(format!("echo: {message}")),
                })
            }
            Mode::Fail => Err(AgentError::Response("model is down".to_string())),
            Mode::Hang => std::future::pending().await,
        }
    }

    fn serialize_session(&self, session: &AgentSession) -> Result<Vec<u8>, AgentError> {
        Ok(session.payload().to_vec())
    }

    fn deserialize_session(&self, payload: &[u8]) -> Result<AgentSession, AgentError> {
        serde_json::from_slice::<FakeState>(payload)
            .map_err(|e| AgentError::Session(e.to_string()))?;
        Ok(AgentSession::from_payload(payload.to_vec()))
    }
}

/// A cache whose backend is always down.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn purge_expired(&self) -> Result<u64, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

/// A working in-memory cache that records the TTL of every write and can be
/// told to fail removals.
#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    writes: Mutex<Vec<(String, Duration)>>,
    fail_remove: AtomicBool,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_remove() -> Arc<Self> {
        let cache = Self::default();
        cache.fail_remove.store(true, Ordering::SeqCst);
        Arc::new(cache)
    }

    /// TTLs of every write to `key`, oldest first.
    pub fn ttls(&self, key: &str) -> Vec<Duration> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, ttl)| *ttl)
            .collect()
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.writes.lock().unwrap().push((key.to_owned(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("remove timed out".to_string()));
        }
        self.inner.remove(key).await
    }

    async fn purge_expired(&self) -> Result<u64, CacheError> {
        self.inner.purge_expired().await
    }
}

pub fn state(
    agent: Arc<FakeAgent>,
    cache: Arc<dyn CacheStore>,
    db: DatabaseConnection,
) -> AppState {
    AppState::new(agent, cache, db)
        .with_identity_header(HeaderName::from_static(USER_HEADER))
        .with_secure_cookies(false)
}

pub struct TestApp {
    pub router: Router,
    pub agent: Arc<FakeAgent>,
    pub cache: Arc<MemoryCache>,
    pub db: DatabaseConnection,
}

pub async fn app(mode: Mode) -> TestApp {
    let db = setup_db().await;
    let agent = FakeAgent::new(mode);
    let cache = Arc::new(MemoryCache::new());
    let router = web::router(state(agent.clone(), cache.clone(), db.clone()));

    TestApp {
        router,
        agent,
        cache,
        db,
    }
}

pub async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, body)
}

pub async fn call_json(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = call(router, request).await;
    let value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("response is not JSON")
    };
    (status, value)
}

pub fn form(uri: &str, user: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/x-www-form-urlencoded");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub fn json(method: &str, uri: &str, user: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty(method: &str, uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn text(body: &Bytes) -> String {
    String::from_utf8(body.to_vec()).expect("body is not UTF-8")
}
