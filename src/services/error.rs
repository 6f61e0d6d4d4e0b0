/**
 * Responsibility
 * - service / collaborator が上位に伝える意味の定義
 * - HTTP への変換は crate::error 側 (From<DomainError> for AppError)
 */
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Exists(String),

    #[error("{0}")]
    SignIn(String),
}
