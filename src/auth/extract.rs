//! Bearer-token extractor for protected handlers

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{Error, Result};
use crate::state::AppState;

/// The authenticated caller, extracted from a `Bearer` access token.
///
/// Adding this parameter to a handler makes the route require
/// authentication; any missing or invalid token rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(Error::Unauthorized)?;

        let claims = state.tokens().validate_access(token)?;
        Ok(AuthUser { email: claims.sub })
    }
}
