//! JSON body extractor whose rejections are `AppError`s.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::{StatusCode, header},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, UPLOAD_SIZE_EXCEEDED_MESSAGE};

pub const APPLICATION_JSON: &str = "application/json";

pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_to_error(rejection, content_type)),
        }
    }
}

fn json_rejection_to_error(rejection: JsonRejection, content_type: Option<String>) -> AppError {
    if let JsonRejection::MissingJsonContentType(_) = rejection {
        return AppError::UnsupportedMediaType {
            content_type,
            supported: vec![APPLICATION_JSON.to_string()],
        };
    }

    let status = rejection.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadSizeExceeded(UPLOAD_SIZE_EXCEEDED_MESSAGE.to_string())
    } else if status.is_client_error() {
        AppError::validation(rejection.body_text())
    } else {
        AppError::internal(rejection.body_text())
    }
}
