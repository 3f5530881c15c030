//! User entity and repository
//!
//! Users are keyed by email (natural key). The password hash never
//! serializes into responses.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::pagination::PageRequest;
use crate::repository::Repository;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub full_name: Option<String>,
}

/// Fields for registration; `password_hash` is already hashed by the caller
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub full_name: Option<String>,
}

/// Partial profile update; `None` fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub full_name: Option<String>,
}

/// PostgreSQL-backed user storage
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Repository<String, User, CreateUser, UpdateUser> for UserRepository {
    async fn find_by_id(&self, email: String) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT email, password_hash, display_name, full_name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self, page: Option<PageRequest>) -> Result<Vec<User>> {
        let users = match page {
            Some(p) => {
                sqlx::query_as::<_, User>(
                    "SELECT email, password_hash, display_name, full_name FROM users \
                     ORDER BY email LIMIT $1 OFFSET $2",
                )
                .bind(p.limit())
                .bind(p.offset())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(
                    "SELECT email, password_hash, display_name, full_name FROM users \
                     ORDER BY email",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, data: CreateUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, display_name, full_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING email, password_hash, display_name, full_name",
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.display_name)
        .bind(data.full_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, email: String, data: UpdateUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
                 display_name = COALESCE($2, display_name), \
                 full_name = COALESCE($3, full_name) \
             WHERE email = $1 \
             RETURNING email, password_hash, display_name, full_name",
        )
        .bind(&email)
        .bind(data.display_name)
        .bind(data.full_name)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| Error::item_not_found("User", email))
    }

    async fn delete(&self, email: String) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
