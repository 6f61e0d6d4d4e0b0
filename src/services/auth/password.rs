//! Argon2id password hashing for stored account secrets.
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters. Verification is one-way: a candidate is hashed and compared.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// One-way comparison of a candidate password against a stored PHC string.
pub trait PasswordMatcher: Send + Sync {
    fn matches(&self, password: &str, phc: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordEncoder;

impl PasswordEncoder {
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::fill(&mut salt_bytes).map_err(|e| PasswordError::Entropy(e.to_string()))?;

        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();

        Ok(phc)
    }

    /// `false` for a wrong password and for a stored hash that is not a valid PHC string.
    pub fn matches(&self, password: &str, phc: &str) -> bool {
        match PasswordHash::new(phc) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl PasswordMatcher for PasswordEncoder {
    fn matches(&self, password: &str, phc: &str) -> bool {
        PasswordEncoder::matches(self, password, phc)
    }
}
