//! Redis cache store over a `deadpool-redis` pool.
//!
//! Values are written with plain `SET` (no expiry), read with `GET`, removed
//! with `DEL` and cleared with `FLUSHALL`.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use reetro_core::{CacheError, ConfigError};

use super::traits::{CacheResult, CacheStore};

/// Redis connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            pool_size: 16,
            timeout_ms: 2_000,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }

    /// Build the connection pool. Connections are opened lazily.
    pub fn create_pool(&self) -> Result<Pool, ConfigError> {
        let mut config = Config::from_url(self.url());
        let mut pool_config = PoolConfig::new(self.pool_size);
        let timeout = Some(Duration::from_millis(self.timeout_ms));
        pool_config.timeouts.wait = timeout;
        pool_config.timeouts.create = timeout;
        pool_config.timeouts.recycle = timeout;
        config.pool = Some(pool_config);

        config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConfigError::InvalidValue {
                field: "REDIS_HOST".to_string(),
                value: self.url(),
                reason: e.to_string(),
            })
    }
}

/// Cache store backed by Redis.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &RedisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.create_pool()?))
    }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| CacheError::Transport {
            reason: e.to_string(),
        })
    }

    /// Round-trip a PING, used by the readiness probe at startup.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(transport)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("pool_status", &self.pool.status())
            .finish()
    }
}

fn transport(e: redis::RedisError) -> CacheError {
    CacheError::Transport {
        reason: e.to_string(),
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await.map_err(transport)
    }

    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key).await.map_err(transport)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(key).await.map_err(transport)?;
        if removed == 0 {
            return Err(CacheError::KeyNotFound {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHALL")
            .query_async(&mut conn)
            .await
            .map_err(transport)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
