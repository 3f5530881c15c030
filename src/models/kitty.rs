//! Kitty entity, breed enum, and repository
//!
//! Kitties carry a surrogate integer id and an optional parent reference;
//! the children of a kitty form its "kittens" relation. Breeds are a closed
//! enum mirrored by a PostgreSQL enum type, so an unknown breed cannot reach
//! the database.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::pagination::PageRequest;
use crate::repository::{parse_record_id, Repository};

/// Supported cat breeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "cat_breed", rename_all = "snake_case")]
pub enum CatBreed {
    BritishShorthair,
    MaineCoon,
    Siamese,
}

impl CatBreed {
    /// Every variant, in declaration order; drives the parser's choices
    pub const ALL: [CatBreed; 3] = [
        CatBreed::BritishShorthair,
        CatBreed::MaineCoon,
        CatBreed::Siamese,
    ];

    /// Wire name of the breed
    pub fn as_str(self) -> &'static str {
        match self {
            CatBreed::BritishShorthair => "british_shorthair",
            CatBreed::MaineCoon => "maine_coon",
            CatBreed::Siamese => "siamese",
        }
    }
}

impl fmt::Display for CatBreed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatBreed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CatBreed::ALL
            .into_iter()
            .find(|breed| breed.as_str() == s)
            .ok_or_else(|| Error::bad_args(format!("unknown breed '{s}'")))
    }
}

/// A kitty
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Kitty {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub breed: CatBreed,
    pub parent_id: Option<i64>,
}

/// A kitty with its children embedded, for detail responses
#[derive(Debug, Clone, Serialize)]
pub struct KittyWithKittens {
    #[serde(flatten)]
    pub kitty: Kitty,
    pub kittens: Vec<Kitty>,
}

/// Fields for creating a kitty
#[derive(Debug, Clone)]
pub struct CreateKitty {
    pub name: String,
    pub age: i32,
    pub breed: CatBreed,
    pub parent_id: Option<i64>,
}

/// Partial kitty update; `None` fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateKitty {
    pub name: Option<String>,
    pub age: Option<i32>,
}

/// PostgreSQL-backed kitty storage
#[derive(Clone)]
pub struct KittyRepository {
    pool: PgPool,
}

impl KittyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch by a raw path segment; a non-numeric id looks the same as a
    /// missing row
    pub async fn get_by_raw_id(&self, raw: &str) -> Result<Option<Kitty>> {
        match parse_record_id(raw) {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Children of a kitty, oldest id first
    pub async fn kittens_of(&self, id: i64) -> Result<Vec<Kitty>> {
        let kittens = sqlx::query_as::<_, Kitty>(
            "SELECT id, name, age, breed, parent_id FROM kitties \
             WHERE parent_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(kittens)
    }

    /// Fetch by a raw path segment with the kittens relation embedded
    pub async fn with_kittens(&self, raw: &str) -> Result<Option<KittyWithKittens>> {
        let Some(kitty) = self.get_by_raw_id(raw).await? else {
            return Ok(None);
        };
        let kittens = self.kittens_of(kitty.id).await?;
        Ok(Some(KittyWithKittens { kitty, kittens }))
    }

    /// Derive a new kitten from a parent: age zero, same breed, parent set
    pub async fn produce_kitten(&self, parent: &Kitty, name: String) -> Result<Kitty> {
        self.create(CreateKitty {
            name,
            age: 0,
            breed: parent.breed,
            parent_id: Some(parent.id),
        })
        .await
    }
}

impl Repository<i64, Kitty, CreateKitty, UpdateKitty> for KittyRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Kitty>> {
        let kitty = sqlx::query_as::<_, Kitty>(
            "SELECT id, name, age, breed, parent_id FROM kitties WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(kitty)
    }

    async fn list(&self, page: Option<PageRequest>) -> Result<Vec<Kitty>> {
        let kitties = match page {
            Some(p) => {
                sqlx::query_as::<_, Kitty>(
                    "SELECT id, name, age, breed, parent_id FROM kitties \
                     ORDER BY id LIMIT $1 OFFSET $2",
                )
                .bind(p.limit())
                .bind(p.offset())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Kitty>(
                    "SELECT id, name, age, breed, parent_id FROM kitties ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(kitties)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM kitties")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, data: CreateKitty) -> Result<Kitty> {
        let kitty = sqlx::query_as::<_, Kitty>(
            "INSERT INTO kitties (name, age, breed, parent_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, age, breed, parent_id",
        )
        .bind(data.name)
        .bind(data.age)
        .bind(data.breed)
        .bind(data.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(kitty)
    }

    async fn update(&self, id: i64, data: UpdateKitty) -> Result<Kitty> {
        let kitty = sqlx::query_as::<_, Kitty>(
            "UPDATE kitties SET \
                 name = COALESCE($2, name), \
                 age = COALESCE($3, age) \
             WHERE id = $1 \
             RETURNING id, name, age, breed, parent_id",
        )
        .bind(id)
        .bind(data.name)
        .bind(data.age)
        .fetch_optional(&self.pool)
        .await?;

        kitty.ok_or_else(|| Error::item_not_found("Kitty", id))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kitties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
