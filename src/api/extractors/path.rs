//! Path-parameter extractor whose rejections are `AppError`s.

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(path_rejection_to_error)
    }
}

fn path_rejection_to_error(rejection: PathRejection) -> AppError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
            ErrorKind::ParseErrorAtKey {
                key, expected_type, ..
            } => AppError::type_mismatch(key.as_str(), *expected_type),
            ErrorKind::ParseErrorAtIndex {
                index,
                expected_type,
                ..
            } => AppError::type_mismatch(format!("path segment {index}"), *expected_type),
            ErrorKind::ParseError { expected_type, .. } => {
                AppError::type_mismatch("path", *expected_type)
            }
            _ => AppError::ConstraintViolation(err.body_text()),
        },
        other => AppError::internal(other.body_text()),
    }
}
