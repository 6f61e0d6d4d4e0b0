/// Factory: build the auth services from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::account::AccountService;
use crate::services::auth::{AccessTokenVerifier, JwtIssuer, PasswordEncoder, PasswordError};
use crate::services::error::DomainError;
use crate::services::users::{InMemoryUserDirectory, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub fn build_auth_service(config: &Config) -> Arc<AccessTokenVerifier> {
    Arc::new(AccessTokenVerifier::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.as_deref(),
        config.access_token_leeway_seconds,
    ))
}

pub fn build_account_service(config: &Config) -> Result<Arc<AccountService>, FactoryError> {
    let passwords = PasswordEncoder;
    let issuer = JwtIssuer::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.clone(),
        config.access_token_ttl_seconds,
    );

    let mut users = InMemoryUserDirectory::new();
    if let Some(admin) = &config.bootstrap_admin {
        users.insert(UserRecord {
            username: admin.username.clone(),
            password_hash: passwords.hash(&admin.password)?,
            authorities: vec!["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()],
        })?;
        tracing::info!(username = %admin.username, "seeded bootstrap admin account");
    }

    // Hash of a random password, checked when the username is unknown
    let mut throwaway = [0u8; 32];
    getrandom::fill(&mut throwaway).map_err(|e| PasswordError::Entropy(e.to_string()))?;
    let unknown_user_hash = passwords.hash(&String::from_utf8_lossy(&throwaway))?;

    Ok(Arc::new(AccountService::new(
        Arc::new(users),
        Arc::new(passwords),
        issuer,
        unknown_user_hash,
    )))
}
