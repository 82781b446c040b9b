//! Reetro API Server Entry Point
//!
//! Loads configuration, wires the selected store and cache backends and
//! starts the Axum HTTP server.

use std::sync::Arc;

use reetro_api::{
    create_router,
    telemetry::{init_tracing, LogFormat},
    ApiError, ApiResult, AppConfig, AppState, CacheBackend, LogMailer, PostgresStore,
    StoreBackend, TokenService,
};
use reetro_storage::{AuthoritativeStore, CacheStore, InMemoryCache, InMemoryStore, RedisCache};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(LogFormat::from_env())?;

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;

    let store: Arc<dyn AuthoritativeStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Postgres => {
            let store = PostgresStore::from_config(&config.db)?;
            store.migrate().await?;
            tracing::info!(pool_size = store.pool_size(), "Postgres store ready");
            Arc::new(store)
        }
    };

    let cache: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(InMemoryCache::new()),
        CacheBackend::Redis => {
            let cache = RedisCache::from_config(&config.redis)?;
            // Startup continues without Redis.
            if let Err(e) = cache.ping().await {
                tracing::warn!(error = %e, url = %config.redis.url(), "Redis not reachable at startup");
            }
            Arc::new(cache)
        }
    };

    let tokens = TokenService::new(config.auth.clone());
    let mailer = Arc::new(LogMailer::new(config.email.clone()));
    let app = create_router(AppState::new(store, cache, tokens, mailer));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Starting reetro API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
