//! Redis connection pool and response caching
//!
//! Paginated listings are cached under versioned keys,
//! `<entity>:v<version>:<page>_<per_page>` (or `:all` for unpaginated
//! listings). Writes bump a per-entity version counter instead of deleting
//! keys, which retires every stale entry at once; old versions age out via
//! the entry TTL. Cache trouble is never a request failure: every operation
//! degrades to a warning and the caller recomputes.

use deadpool_redis::{Config as DeadpoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;

use crate::{
    config::RedisConfig,
    error::{Error, Result},
    pagination::PageRequest,
};

/// Create a Redis connection pool, retrying with exponential backoff
pub async fn create_pool(config: &RedisConfig) -> Result<Pool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Redis connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Redis connection pool created: max_connections={}",
                        config.max_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to Redis after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                tracing::warn!(
                    "Redis connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_create_pool(config: &RedisConfig) -> Result<Pool> {
    let cfg = DeadpoolConfig::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| Error::Internal(format!("Failed to build Redis pool: {e}")))?
        .max_size(config.max_connections as usize)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create Redis pool: {e}")))?;

    // Test the connection
    let conn = pool
        .get()
        .await
        .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {e}")))?;
    drop(conn);

    Ok(pool)
}

/// Versioned response cache for listing endpoints
#[derive(Clone)]
pub struct ResponseCache {
    pool: Pool,
    ttl_secs: u64,
}

impl ResponseCache {
    pub fn new(pool: Pool, ttl_secs: u64) -> Self {
        Self { pool, ttl_secs }
    }

    /// Cached response body for this entity/page, or `None` on miss or any
    /// cache error
    pub async fn get_page(&self, entity: &str, page: Option<PageRequest>) -> Option<Value> {
        match self.fetch(entity, page).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cache read for '{}' failed, recomputing: {}", entity, e);
                None
            }
        }
    }

    /// Store a response body for this entity/page; errors degrade to a
    /// warning
    pub async fn put_page(&self, entity: &str, page: Option<PageRequest>, value: &Value) {
        if let Err(e) = self.store(entity, page, value).await {
            tracing::warn!("Cache write for '{}' failed: {}", entity, e);
        }
    }

    /// Invalidate every cached page of an entity by bumping its version
    pub async fn bump_version(&self, entity: &str) {
        if let Err(e) = self.incr_version(entity).await {
            tracing::warn!("Cache invalidation for '{}' failed: {}", entity, e);
        }
    }

    async fn fetch(&self, entity: &str, page: Option<PageRequest>) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let key = self.page_key(&mut conn, entity, page).await?;
        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| Error::Internal(format!("Corrupt cache entry '{key}': {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, entity: &str, page: Option<PageRequest>, value: &Value) -> Result<()> {
        let mut conn = self.connection().await?;
        let key = self.page_key(&mut conn, entity, page).await?;
        conn.set_ex::<_, _, ()>(&key, value.to_string(), self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn incr_version(&self, entity: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.incr::<_, _, i64>(format!("cache_version:{entity}"), 1)
            .await?;
        Ok(())
    }

    async fn page_key(
        &self,
        conn: &mut deadpool_redis::Connection,
        entity: &str,
        page: Option<PageRequest>,
    ) -> Result<String> {
        let version: Option<i64> = conn.get(format!("cache_version:{entity}")).await?;
        let version = version.unwrap_or(0);
        Ok(match page {
            Some(p) => format!("{entity}:v{version}:{}_{}", p.page, p.per_page),
            None => format!("{entity}:v{version}:all"),
        })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {e}")))
    }
}
