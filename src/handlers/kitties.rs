//! Kitty listing, creation, detail, and derivation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use std::str::FromStr;

use crate::{
    auth::AuthUser,
    error::{Error, Result},
    models::{CatBreed, CreateKitty, Kitty, KittyWithKittens},
    pagination::{parse_pagination, PageMeta, PageRequest},
    parser::{ArgKind, Argument, ParserSchema, RequestInput},
    repository::Repository,
    responses::Envelope,
    state::AppState,
};

/// Cache namespace for kitty listings
const CACHE_ENTITY: &str = "kitties";

static KITTY_SCHEMA: Lazy<ParserSchema> = Lazy::new(|| {
    ParserSchema::builder()
        .arg(Argument::new("name").required())
        .arg(Argument::new("age").with_kind(ArgKind::Int).required())
        .arg(
            Argument::new("breed")
                .required()
                .with_choices(CatBreed::ALL.map(CatBreed::as_str)),
        )
        .build()
        .expect("kitty schema is statically valid")
});

static DERIVE_SCHEMA: Lazy<ParserSchema> = Lazy::new(|| {
    ParserSchema::builder()
        .arg(Argument::new("name").required())
        .build()
        .expect("derive schema is statically valid")
});

/// `GET /api/v1/kitties` — full list, or one page when both `page` and
/// `per_page` are given; cached when Redis is configured
pub async fn list_kitties(
    State(state): State<AppState>,
    _user: AuthUser,
    input: RequestInput,
) -> Result<Response> {
    let args = parse_pagination(&input)?;
    let page = PageRequest::from_args(&args);

    if let Some(cache) = state.cache() {
        if let Some(value) = cache.get_page(CACHE_ENTITY, page).await {
            tracing::debug!("Kitty listing served from cache");
            return Ok((StatusCode::OK, Json(value)).into_response());
        }
    }

    let repo = state.kitties();
    let envelope = match page {
        Some(request) => {
            // Page validity is checked against the count before fetching rows
            let total_items = repo.count().await?;
            let meta = PageMeta::compute(request, total_items)?;
            let kitties = repo.list(Some(request)).await?;
            Envelope::ok(kitties).with_info("pagination", &meta)?
        }
        None => Envelope::ok(repo.list(None).await?),
    };

    let value = envelope.to_value()?;
    if let Some(cache) = state.cache() {
        cache.put_page(CACHE_ENTITY, page, &value).await;
    }

    Ok((StatusCode::OK, Json(value)).into_response())
}

/// `POST /api/v1/kitties`
pub async fn create_kitty(
    State(state): State<AppState>,
    _user: AuthUser,
    input: RequestInput,
) -> Result<Envelope<Kitty>> {
    let args = KITTY_SCHEMA.parse(&input)?;

    let age_raw = args.integer("age")?;
    let age = i32::try_from(age_raw)
        .map_err(|_| Error::bad_args(format!("argument 'age' out of range: {age_raw}")))?;
    let breed = CatBreed::from_str(args.string("breed")?)?;

    let kitty = state
        .kitties()
        .create(CreateKitty {
            name: args.string("name")?.to_string(),
            age,
            breed,
            parent_id: None,
        })
        .await?;

    if let Some(cache) = state.cache() {
        cache.bump_version(CACHE_ENTITY).await;
    }

    tracing::info!("Created kitty {} ({})", kitty.name, kitty.id);
    Ok(Envelope::created(kitty))
}

/// `GET /api/v1/kitties/{id}` — detail with the kittens relation embedded
pub async fn get_kitty(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<KittyWithKittens>> {
    let kitty = state
        .kitties()
        .with_kittens(&id)
        .await?
        .ok_or_else(|| Error::item_not_found("Kitty", &id))?;

    Ok(Envelope::ok(kitty))
}

/// `PATCH /api/v1/kitties/{id}` — derive a new kitten from this parent
pub async fn produce_kitten(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    input: RequestInput,
) -> Result<Envelope<Kitty>> {
    let args = DERIVE_SCHEMA.parse(&input)?;

    let repo = state.kitties();
    let parent = repo
        .get_by_raw_id(&id)
        .await?
        .ok_or_else(|| Error::item_not_found("Kitty", &id))?;

    let kitten = repo
        .produce_kitten(&parent, args.string("name")?.to_string())
        .await?;

    if let Some(cache) = state.cache() {
        cache.bump_version(CACHE_ENTITY).await;
    }

    tracing::info!("Kitty {} produced kitten {}", parent.id, kitten.id);
    Ok(Envelope::ok(kitten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn body(pairs: &[(&str, &str)]) -> RequestInput {
        RequestInput::new(
            Method::POST,
            vec![],
            Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        )
    }

    #[test]
    fn test_kitty_schema_accepts_every_breed() {
        for breed in CatBreed::ALL {
            let args = KITTY_SCHEMA
                .parse(&body(&[
                    ("name", "Whiskers"),
                    ("age", "3"),
                    ("breed", breed.as_str()),
                ]))
                .unwrap();
            assert_eq!(args.opt_str("breed"), Some(breed.as_str()));
        }
    }

    #[test]
    fn test_kitty_schema_rejects_unknown_breed() {
        let err = KITTY_SCHEMA
            .parse(&body(&[
                ("name", "Whiskers"),
                ("age", "3"),
                ("breed", "dragon"),
            ]))
            .unwrap_err();
        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert!(messages[0].contains("dragon"));
        assert!(messages[0].contains("british_shorthair"));
    }

    #[test]
    fn test_schema_choices_and_enum_agree() {
        // every accepted choice must parse into the enum
        for breed in CatBreed::ALL {
            assert_eq!(CatBreed::from_str(breed.as_str()).unwrap(), breed);
        }
    }
}
