/*
 * Responsibility
 * - /api/account の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SignInRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.username.len() > 128 {
            return Err("username must be <= 128 chars");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}
