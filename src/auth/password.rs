//! Password hashing using Argon2id
//!
//! Argon2id with OWASP-recommended parameters, producing PHC string format
//! hashes. Parameters come from [`PasswordConfig`].

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::error::{Error, Result};

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(&PasswordConfig::default())
    }
}

impl PasswordHasher {
    /// Create a hasher from configuration.
    ///
    /// Falls back to the library defaults if the configured parameters are
    /// outside Argon2's accepted ranges.
    pub fn new(config: &PasswordConfig) -> Self {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .unwrap_or_else(|e| {
            tracing::warn!("Invalid Argon2 parameters ({}), using defaults", e);
            Params::default()
        });

        Self {
            params,
            min_password_length: config.min_password_length,
        }
    }

    /// Hash a password into a PHC format string.
    ///
    /// Passwords shorter than the configured minimum are rejected as a
    /// validation failure.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.len() < self.min_password_length {
            return Err(Error::bad_args(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC hash, constant-time.
    ///
    /// A wrong password is `Ok(false)`; a malformed stored hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::default();
        let password = "test_password_123";

        let hash = hasher.hash(password).expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher.verify(password, &hash).expect("Verification failed"));
        assert!(!hasher
            .verify("wrong_password", &hash)
            .expect("Verification failed"));
    }

    #[test]
    fn test_password_too_short() {
        let hasher = PasswordHasher::default();
        let result = hasher.hash("short");

        assert!(matches!(result, Err(Error::BadArgs(_))));
    }

    #[test]
    fn test_custom_min_length() {
        let hasher = PasswordHasher::new(&PasswordConfig {
            min_password_length: 12,
            ..Default::default()
        });

        assert!(hasher.hash("0123456789").is_err());
        assert!(hasher.hash("012345678901").is_ok());
    }

    #[test]
    fn test_invalid_hash_format() {
        let hasher = PasswordHasher::default();
        assert!(hasher.verify("password", "not_a_valid_hash").is_err());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hasher = PasswordHasher::default();
        let password = "test_password_123";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Different salts = different hashes
        assert_ne!(hash1, hash2);

        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }
}
