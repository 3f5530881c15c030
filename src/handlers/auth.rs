//! Registration, login, and token verification

use axum::extract::State;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    auth::AuthUser,
    error::{Error, Result},
    models::{CreateUser, User},
    parser::{Argument, ParseOptions, ParserSchema, RequestInput},
    repository::Repository,
    responses::Envelope,
    state::AppState,
};

/// Shared schema for registration; login narrows it with `include_only`
static REGISTER_SCHEMA: Lazy<ParserSchema> = Lazy::new(|| {
    ParserSchema::builder()
        .arg(Argument::new("email").required())
        .arg(Argument::new("password").required())
        .arg(Argument::new("display_name").required())
        .arg(Argument::new("full_name"))
        .build()
        .expect("register schema is statically valid")
});

/// Shape check only; deliverability is the mail server's problem
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is statically valid")
});

fn validate_email(email: &str) -> Result<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(Error::bad_args(format!(
            "malformed email address '{email}'"
        )))
    }
}

/// A duplicate email surfaces as a conflict naming the address instead of
/// the generic constraint-violation message
fn registration_conflict(err: Error, email: &str) -> Error {
    if let Error::Database(e) = &err {
        if let sqlx::Error::Database(db) = &**e {
            if db.is_unique_violation() {
                return Error::Conflict(format!("user '{email}' already exists"));
            }
        }
    }
    err
}

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    input: RequestInput,
) -> Result<Envelope<User>> {
    let args = REGISTER_SCHEMA.parse(&input)?;

    let email = args.string("email")?;
    validate_email(email)?;

    let password_hash = state.hasher().hash(args.string("password")?)?;

    let user = state
        .users()
        .create(CreateUser {
            email: email.to_string(),
            password_hash,
            display_name: args.string("display_name")?.to_string(),
            full_name: args.opt_str("full_name").map(str::to_string),
        })
        .await
        .map_err(|e| registration_conflict(e, email))?;

    tracing::info!("Registered user {}", user.email);
    Ok(Envelope::created(user))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    input: RequestInput,
) -> Result<Envelope<User>> {
    let args = REGISTER_SCHEMA.parse_with(
        &input,
        ParseOptions {
            include_only: Some(&["email", "password"]),
            ignore_required: false,
        },
    )?;

    let email = args.string("email")?;
    validate_email(email)?;

    // One failure path for unknown email and wrong password
    let user = state
        .users()
        .find_by_id(email.to_string())
        .await?
        .ok_or(Error::Unauthorized)?;

    if !state
        .hasher()
        .verify(args.string("password")?, &user.password_hash)?
    {
        return Err(Error::Unauthorized);
    }

    let pair = state.tokens().issue_pair(&user.email)?;

    tracing::info!("User {} logged in", user.email);
    Envelope::ok(user)
        .with_info("access_token", &pair.access_token)?
        .with_info("refresh_token", &pair.refresh_token)
}

/// `GET /api/v1/auth/login` — token check, returns the authenticated user
pub async fn check_auth(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Envelope<User>> {
    // A valid token for a deleted user is still a failed authentication
    let user = state
        .users()
        .find_by_id(user.email)
        .await?
        .ok_or(Error::Unauthorized)?;

    Ok(Envelope::ok(user))
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
    fn test_email_shape() {
        assert!(validate_email("cat@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("cat@nodot").is_err());
        assert!(validate_email("two words@example.com").is_err());
    }

    #[test]
    fn test_register_schema_batches_missing_fields() {
        let err = REGISTER_SCHEMA.parse(&body(&[])).unwrap_err();
        let Error::BadArgs(messages) = err else {
            panic!("expected BadArgs");
        };
        assert_eq!(messages.len(), 3);
    }

    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_duplicate_email_becomes_a_named_conflict() {
        let err = Error::from(sqlx::Error::Database(Box::new(DuplicateKey)));
        let mapped = registration_conflict(err, "cat@example.com");
        let Error::Conflict(msg) = mapped else {
            panic!("expected Conflict");
        };
        assert!(msg.contains("cat@example.com"));
    }

    #[test]
    fn test_other_registration_errors_pass_through() {
        let mapped = registration_conflict(Error::Unauthorized, "cat@example.com");
        assert!(matches!(mapped, Error::Unauthorized));
    }

    #[test]
    fn test_login_reuses_register_schema() {
        let args = REGISTER_SCHEMA
            .parse_with(
                &body(&[("email", "cat@example.com"), ("password", "hunter22")]),
                ParseOptions {
                    include_only: Some(&["email", "password"]),
                    ignore_required: false,
                },
            )
            .unwrap();
        assert!(args.has_all(&["email", "password"]));
        // display_name was not part of the parse
        assert!(args.get("display_name").is_none());
    }
}
