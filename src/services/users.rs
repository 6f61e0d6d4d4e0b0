//! User directory: the credential-lookup collaborator used by account sign-in.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::services::error::DomainError;

/// Stored identity for username/password sign-in.
#[derive(Clone)]
pub struct UserRecord {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub authorities: Vec<String>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the password hash
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("authorities", &self.authorities)
            .finish()
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when no such user exists.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DomainError>;

    /// All users, ordered by username.
    async fn list(&self) -> Result<Vec<UserRecord>, DomainError>;
}

/// Directory held in memory, populated before the server starts.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: UserRecord) -> Result<(), DomainError> {
        if self.users.contains_key(&user.username) {
            return Err(DomainError::Exists(format!(
                "User {} already exists",
                user.username
            )));
        }
        self.users.insert(user.username.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DomainError> {
        Ok(self.users.get(username).cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, DomainError> {
        let mut users: Vec<UserRecord> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
