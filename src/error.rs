/*
 * Responsibility
 * - アプリ共通の AppError 定義 (handler / extractor / middleware が返すエラー)
 * - ApiError: すべてのエラーレスポンスが共有する JSON envelope
 * - IntoResponse 実装 (variant → HTTP status / message / details の対応表)
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::services::error::DomainError;

pub const ACCESS_DENIED_MESSAGE: &str = "You are not authorized to access this resource!";
pub const UNAUTHORIZED_MESSAGE: &str = "Full authentication is required to access this resource";
pub const INTERNAL_DETAILS: &str = "An error occurred!";
pub const INTERNAL_FALLBACK_MESSAGE: &str = "Internal server error";
pub const UPLOAD_SIZE_EXCEEDED_MESSAGE: &str = "Maximum upload size exceeded";

/// The JSON body of every error response.
///
/// `status` is serialized as the numeric code and always equals the HTTP status
/// of the response carrying it.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    pub message: String,
    pub details: String,
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            message: message.into(),
            details: details.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Where the `details` text of an error comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Details {
    /// Describe the request that failed (`uri=/path`). Only the error boundary knows the
    /// request, so it is filled in there.
    Request,
    Text(String),
}

/// What an error rendered, minus the timestamp.
///
/// `AppError::into_response` leaves one of these in the response extensions so that the
/// error boundary can re-render the body with the request description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub details: Details,
}

impl ErrorReport {
    pub fn new(status: StatusCode, message: impl Into<String>, details: Details) -> Self {
        Self {
            status,
            message: message.into(),
            details,
        }
    }

    pub fn render(&self, request_path: Option<&str>) -> ApiError {
        let details = match &self.details {
            Details::Text(text) => text.clone(),
            Details::Request => request_path
                .map(|path| format!("uri={path}"))
                .unwrap_or_default(),
        };

        ApiError::new(self.status, self.message.clone(), details)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing request parameter: {name}")]
    MissingParameter { name: String },

    #[error("method {method} not allowed")]
    MethodNotAllowed {
        method: String,
        supported: Vec<String>,
    },

    #[error("unsupported media type: {}", content_type.as_deref().unwrap_or("none"))]
    UnsupportedMediaType {
        content_type: Option<String>,
        supported: Vec<String>,
    },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{name} should be of type {required_type}")]
    TypeMismatch { name: String, required_type: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Exists(String),

    #[error("{0}")]
    SignIn(String),

    #[error("{0}")]
    UploadSizeExceeded(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn type_mismatch(name: impl Into<String>, required_type: impl Into<String>) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            required_type: required_type.into(),
        }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied(reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Maps the error to its status, message and details. Most specific cases first.
    pub fn report(&self) -> ErrorReport {
        match self {
            Self::Validation(message) => {
                ErrorReport::new(StatusCode::BAD_REQUEST, message.clone(), Details::Request)
            }
            Self::MissingParameter { name } => ErrorReport::new(
                StatusCode::BAD_REQUEST,
                format!("Parameter {name} is missing"),
                Details::Request,
            ),
            Self::MethodNotAllowed { method, supported } => ErrorReport::new(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("Request method '{method}' is not supported"),
                Details::Text(format!(
                    "{method} method is not supported for this request. Supported methods are {}",
                    list_or_none(supported, " ")
                )),
            ),
            Self::UnsupportedMediaType {
                content_type,
                supported,
            } => {
                let supported = list_or_none(supported, ", ");
                let (message, details) = match content_type {
                    Some(ct) => (
                        format!("Content type '{ct}' is not supported"),
                        format!(
                            "{ct} media type is not supported. Supported media types are {supported}"
                        ),
                    ),
                    None => (
                        "Content type is not specified".to_string(),
                        format!(
                            "Media type is not specified. Supported media types are {supported}"
                        ),
                    ),
                };
                ErrorReport::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    message,
                    Details::Text(details),
                )
            }
            Self::ConstraintViolation(message) => {
                ErrorReport::new(StatusCode::BAD_REQUEST, message.clone(), Details::Request)
            }
            // Existing clients expect 415 here.
            Self::TypeMismatch {
                name,
                required_type,
            } => ErrorReport::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("{name} should be of type {required_type}"),
                Details::Request,
            ),
            Self::NotFound(message) => {
                ErrorReport::new(StatusCode::NOT_FOUND, message.clone(), Details::Request)
            }
            Self::Exists(message) | Self::SignIn(message) => {
                ErrorReport::new(StatusCode::BAD_REQUEST, message.clone(), Details::Request)
            }
            Self::UploadSizeExceeded(message) => ErrorReport::new(
                StatusCode::EXPECTATION_FAILED,
                message.clone(),
                Details::Request,
            ),
            Self::AccessDenied(reason) => ErrorReport::new(
                StatusCode::FORBIDDEN,
                ACCESS_DENIED_MESSAGE,
                Details::Text(reason.clone()),
            ),
            Self::Unauthorized(reason) => ErrorReport::new(
                StatusCode::UNAUTHORIZED,
                UNAUTHORIZED_MESSAGE,
                Details::Text(reason.clone()),
            ),
            Self::Internal(message) => {
                let message = if message.trim().is_empty() {
                    INTERNAL_FALLBACK_MESSAGE.to_string()
                } else {
                    message.clone()
                };
                ErrorReport::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                    Details::Text(INTERNAL_DETAILS.to_string()),
                )
            }
        }
    }
}

fn list_or_none(items: &[String], separator: &str) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(separator)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = self.report();
        let mut response = report.render(None).into_response();

        if matches!(self, Self::Unauthorized(_)) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response.extensions_mut().insert(report);
        response
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(message) => Self::NotFound(message),
            DomainError::Exists(message) => Self::Exists(message),
            DomainError::SignIn(message) => Self::SignIn(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
