//! Accounts: username/password sign-in for `/api/account` and the user queries
//! behind `/api/admin/users`.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::AppError;
use crate::services::auth::{IssuedAccessToken, JwtIssuer, PasswordMatcher};
use crate::services::error::DomainError;
use crate::services::users::{UserDirectory, UserRecord};

pub const BAD_CREDENTIALS: &str = "Bad credentials";

/// Upper bound for `limit` on user listings.
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    passwords: Arc<dyn PasswordMatcher>,
    issuer: JwtIssuer,
    // Stored hash used for the password check when the username is unknown
    unknown_user_hash: Arc<str>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        passwords: Arc<dyn PasswordMatcher>,
        issuer: JwtIssuer,
        unknown_user_hash: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            users,
            passwords,
            issuer,
            unknown_user_hash: unknown_user_hash.into(),
        }
    }

    /// Check the credentials and issue an access token.
    ///
    /// Unknown user and wrong password produce the same `SignIn` error, and both
    /// run one password verification.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedAccessToken, AppError> {
        let user = self.users.find_by_username(username).await?;

        let stored: Arc<str> = match &user {
            Some(user) => Arc::from(user.password_hash.as_str()),
            None => Arc::clone(&self.unknown_user_hash),
        };
        let matched = self.verify_password(password, stored).await?;

        let Some(user) = user else {
            debug!(username = %username, "sign-in for unknown user");
            return Err(DomainError::SignIn(BAD_CREDENTIALS.to_string()).into());
        };

        if !matched {
            debug!(username = %username, "sign-in with wrong password");
            return Err(DomainError::SignIn(BAD_CREDENTIALS.to_string()).into());
        }

        self.issuer
            .issue_access_token(&user.username, &user.authorities)
            .map_err(|e| AppError::internal(e.to_string()))
    }

    // Argon2 verification runs on the blocking pool.
    async fn verify_password(&self, password: &str, stored: Arc<str>) -> Result<bool, AppError> {
        let passwords = Arc::clone(&self.passwords);
        let candidate = password.to_owned();

        tokio::task::spawn_blocking(move || passwords.matches(&candidate, &stored))
            .await
            .map_err(|e| {
                error!(error = %e, "password verification task failed");
                AppError::internal("password verification failed")
            })
    }

    pub async fn find_user(&self, username: &str) -> Result<UserRecord, AppError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {username} not found")).into())
    }

    /// Users ordered by username, `offset` skipped, at most `limit` returned.
    pub async fn list_users(&self, offset: usize, limit: usize) -> Result<Vec<UserRecord>, AppError> {
        let limit = checked_limit(limit)?;

        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    /// Users whose username starts with `prefix`, at most `limit` returned.
    pub async fn search_users(&self, prefix: &str, limit: usize) -> Result<Vec<UserRecord>, AppError> {
        let limit = checked_limit(limit)?;

        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .filter(|user| user.username.starts_with(prefix))
            .take(limit)
            .collect())
    }
}

fn checked_limit(limit: usize) -> Result<usize, AppError> {
    if (1..=MAX_PAGE_SIZE).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )))
    }
}
