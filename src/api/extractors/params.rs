//! Query-string extractors whose rejections are `AppError`s.
//!
//! - `ApiQuery<T>`: typed query struct; a value that violates the struct's
//!   constraints is a `ConstraintViolation`.
//! - `QueryParams`: raw parameters with per-name `required` / `parse` lookups, which
//!   report `MissingParameter` and `TypeMismatch` with the parameter name.

use std::any::type_name;
use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| AppError::ConstraintViolation(rejection.body_text()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn required(&self, name: &str) -> Result<&str, AppError> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::missing_parameter(name))
    }

    /// `Ok(None)` when absent; `TypeMismatch` when present but not a `T`.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.0
            .get(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::type_mismatch(name, type_name::<T>()))
            })
            .transpose()
    }

    pub fn required_parsed<T: FromStr>(&self, name: &str) -> Result<T, AppError> {
        self.parse(name)?
            .ok_or_else(|| AppError::missing_parameter(name))
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| Self(params))
            .map_err(|rejection| AppError::ConstraintViolation(rejection.body_text()))
    }
}
