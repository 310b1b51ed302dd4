//! HTTP surface: router, shared state, and handlers.

mod chat;
pub mod identity;
mod profiles;

use std::sync::Arc;

use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::agent::ChatAgent;
use crate::cache::CacheStore;
use crate::chat::ChatService;
use crate::profile::ProfileService;
use crate::session_store::CacheSessionStore;

pub use chat::{HealthReport, SendForm};
pub use identity::AuthUser;
pub use profiles::{ProfileBody, ProfileSaved};

/// Services shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub profiles: Arc<ProfileService>,
    pub sessions: CacheSessionStore,
    pub identity_header: Option<HeaderName>,
    pub secure_cookies: bool,
    /// Cancelled on shutdown; in-flight model calls abort without saving.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        agent: Arc<dyn ChatAgent>,
        cache: Arc<dyn CacheStore>,
        db: DatabaseConnection,
    ) -> Self {
        Self {
            chat: Arc::new(ChatService::new(agent, cache.clone())),
            profiles: Arc::new(ProfileService::new(db, cache.clone())),
            sessions: CacheSessionStore::new(cache),
            identity_header: None,
            secure_cookies: true,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_identity_header(mut self, header: HeaderName) -> Self {
        self.identity_header = Some(header);
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// All application routes, without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/send", post(chat::send))
        .route("/chat/reset", post(chat::reset))
        .route("/chat/health", get(chat::health))
        .route("/profile", get(profiles::current).post(profiles::upsert))
        .route("/profiles", get(profiles::list).post(profiles::create))
        .route(
            "/profiles/{id}",
            get(profiles::view)
                .put(profiles::update)
                .delete(profiles::delete),
        )
}

/// Cookie sessions carrying the signed-in identity. Inactive sessions expire
/// after a week.
pub fn session_layer(
    store: CacheSessionStore,
    secure: bool,
) -> SessionManagerLayer<CacheSessionStore> {
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7)))
}

/// The complete application.
pub fn router(state: AppState) -> Router {
    let sessions = session_layer(state.sessions.clone(), state.secure_cookies);

    routes()
        .with_state(state)
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
}
