//! JWT issuance and validation (HS256)
//!
//! Logins are issued a pair: a short-lived access token and a long-lived
//! refresh token, both HS256-signed with the configured secret. The token
//! kind is embedded in the claims so a refresh token cannot authenticate a
//! request.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Token kind embedded in the claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub kind: TokenKind,
}

/// Access and refresh token issued together at login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates HS256-signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Issue an access/refresh pair for a user
    pub fn issue_pair(&self, email: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(email, TokenKind::Access, self.access_ttl_secs)?,
            refresh_token: self.issue(email, TokenKind::Refresh, self.refresh_ttl_secs)?,
        })
    }

    fn issue(&self, email: &str, kind: TokenKind, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: email.to_string(),
            exp: now + ttl_secs,
            iat: now,
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {e}")))
    }

    /// Validate an access token, returning its claims.
    ///
    /// Expired, malformed, wrongly signed, and refresh-kind tokens all fail
    /// identically with [`Error::Unauthorized`].
    pub fn validate_access(&self, token: &str) -> Result<Claims> {
        self.validate(token, TokenKind::Access)
    }

    fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| Error::Unauthorized)?;

        if data.claims.kind != expected {
            return Err(Error::Unauthorized);
        }

        Ok(data.claims)
    }
}
