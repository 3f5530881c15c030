//! Error types and HTTP response conversion
//!
//! Every failure in the request path funnels into [`Error`] and is rendered
//! through a single [`IntoResponse`] impl, so clients always receive the same
//! error envelope: `{ error, status_code, additional_information }`.
//!
//! Validation failures are batched: [`Error::BadArgs`] carries the full
//! ordered list of messages collected while parsing one request, and the
//! `error` field of the envelope becomes a JSON array in that case.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

/// Message used for every 401 response, regardless of cause.
///
/// Bad credentials, a missing bearer token, and an expired or malformed
/// token are deliberately indistinguishable to the client.
pub const AUTH_ERROR: &str = "Authentication failed";

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Database error
    #[error("Database error: {0}")]
    Database(Box<sqlx::Error>),

    /// Redis error
    #[error("Redis error: {0}")]
    Redis(Box<redis::RedisError>),

    /// Invalid request arguments, with every violation collected for this
    /// request (missing required, bad choice, bad type, duplicate
    /// registration)
    #[error("Invalid arguments: {}", .0.join("; "))]
    BadArgs(Vec<String>),

    /// Bad credentials or a missing/expired/invalid token
    #[error("{AUTH_ERROR}")]
    Unauthorized,

    /// Missing entity or out-of-range page
    #[error("Not found: {0}")]
    NotFound(String),

    /// Known route, unsupported method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Resource conflict (duplicate creation)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Single-message convenience constructor for [`Error::BadArgs`]
    pub fn bad_args(message: impl Into<String>) -> Self {
        Error::BadArgs(vec![message.into()])
    }

    /// "Could not find item" error in the canonical message format,
    /// e.g. `Could not find item <Kitty(id: '999')>`
    pub fn item_not_found(entity: &str, id: impl Display) -> Self {
        Error::NotFound(format!("Could not find item <{entity}(id: '{id}')>"))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// A message, or an ordered array of messages for batched validation
    /// failures
    pub error: Value,

    /// HTTP status code, repeated in the body
    pub status_code: u16,

    /// Extra context; empty object unless a handler attached something
    pub additional_information: serde_json::Map<String, Value>,
}

impl ErrorBody {
    fn new(status: StatusCode, error: Value) -> Self {
        Self {
            error,
            status_code: status.as_u16(),
            additional_information: serde_json::Map::new(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Error::BadArgs(messages) => {
                (StatusCode::BAD_REQUEST, Value::from(messages))
            }

            Error::Unauthorized => (StatusCode::UNAUTHORIZED, Value::from(AUTH_ERROR)),

            Error::NotFound(msg) => (StatusCode::NOT_FOUND, Value::from(msg)),

            Error::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Value::from("Method not allowed"),
            ),

            Error::Conflict(msg) => (StatusCode::CONFLICT, Value::from(msg)),

            Error::Database(e) => match *e {
                sqlx::Error::RowNotFound => {
                    (StatusCode::NOT_FOUND, Value::from("Resource not found"))
                }
                sqlx::Error::Database(ref db_err)
                    if db_err.is_unique_violation()
                        || db_err.is_foreign_key_violation()
                        || db_err.is_check_violation() =>
                {
                    (
                        StatusCode::CONFLICT,
                        Value::from("Operation conflicts with existing data"),
                    )
                }
                ref other => {
                    tracing::error!("Database error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Value::from("Database operation failed"),
                    )
                }
            },

            Error::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::from("Cache operation failed"),
                )
            }

            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::from("Internal server error"),
                )
            }

            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::from("I/O operation failed"),
                )
            }

            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::from("Internal server error"),
                )
            }
        };

        (status, Json(ErrorBody::new(status, error))).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(Box::new(err))
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Redis(Box::new(err))
    }
}
