use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use folio_chat::agent::{ChatAgent, OllamaAgent};
use folio_chat::cache::{CacheStore, DbCache};
use folio_chat::web::{self, AppState};
use folio_chat::Config;
use sea_orm::{ConnectOptions, Database};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.db_max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    info!("Connected to database");

    #[cfg(feature = "migration")]
    {
        use sea_orm_migration::MigratorTrait;
        folio_chat::migration::Migrator::up(&db, None).await?;
        info!("Database migrations applied");
    }

    let cache: Arc<dyn CacheStore> = Arc::new(DbCache::new(db.clone()));
    let agent: Arc<dyn ChatAgent> = Arc::new(OllamaAgent::new(config.ollama.clone())?);
    info!(model = %config.ollama.model, url = %config.ollama.base_url, "Using Ollama model");

    let shutdown = CancellationToken::new();
    let mut state = AppState::new(agent, cache.clone(), db)
        .with_secure_cookies(config.secure_cookies)
        .with_shutdown(shutdown.clone());
    if let Some(header) = config.identity_header.clone() {
        state = state.with_identity_header(header);
    }

    let purge = tokio::spawn(purge_expired(
        cache,
        config.cache_purge_interval,
        shutdown.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Err(err) = purge.await {
        warn!(error = %err, "cache purge task ended abnormally");
    }

    Ok(())
}

async fn purge_expired(cache: Arc<dyn CacheStore>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => match cache.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired cache entries"),
                Err(err) => warn!(error = %err, "cache purge failed"),
            },
        }
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(err) => {
            error!(error = %err, "unable to listen for shutdown signal");
            shutdown.cancelled().await;
        }
    }
    shutdown.cancel();
}
