//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{PasswordHasher, TokenIssuer},
    cache::{self, ResponseCache},
    config::Config,
    database,
    error::Result,
    models::{KittyRepository, UserRepository},
};

/// State shared by every handler.
///
/// Cheap to clone; the pools are internally reference-counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    db: PgPool,
    cache: Option<ResponseCache>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
}

impl AppState {
    /// Build the full state: connect pools, derive auth components
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = database::create_pool(&config.database).await?;

        let cache = match &config.redis {
            Some(redis_config) => {
                let pool = cache::create_pool(redis_config).await?;
                Some(ResponseCache::new(pool, redis_config.ttl_secs))
            }
            None => {
                tracing::info!("No Redis configured, response caching disabled");
                None
            }
        };

        Ok(Self::assemble(config, db, cache))
    }

    /// Assemble state over existing pools, mainly for tests
    pub fn assemble(config: Config, db: PgPool, cache: Option<ResponseCache>) -> Self {
        let tokens = TokenIssuer::new(&config.auth);
        let hasher = PasswordHasher::new(&config.auth.password);
        Self {
            config: Arc::new(config),
            db,
            cache,
            tokens,
            hasher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db.clone())
    }

    pub fn kitties(&self) -> KittyRepository {
        KittyRepository::new(self.db.clone())
    }
}
