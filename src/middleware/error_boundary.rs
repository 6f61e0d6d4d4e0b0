//! Error boundary: the single place where error responses get their final shape.
//!
//! Every response passing through is checked once:
//! - responses rendered from an `AppError` carry an `ErrorReport`; the body is
//!   re-rendered so request-dependent `details` (`uri=/path`) are filled in
//! - bare framework responses (router 404/405, body-limit 413, timeout 408, ...)
//!   are turned into the same `ApiError` envelope
//! - successful responses and responses that already carry JSON pass untouched

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Details, ErrorReport, UPLOAD_SIZE_EXCEEDED_MESSAGE};

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(error_boundary))
}

async fn error_boundary(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    normalize(&method, &path, response)
}

fn normalize(method: &Method, path: &str, response: Response) -> Response {
    let rendered = response.extensions().get::<ErrorReport>().cloned();
    let Some(report) = rendered.or_else(|| framework_report(method, path, &response)) else {
        return response;
    };

    if report.status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = report.status.as_u16(),
            message = %report.message,
            "request failed"
        );
    } else {
        tracing::debug!(
            method = %method,
            path = %path,
            status = report.status.as_u16(),
            "request rejected"
        );
    }

    rebuild(response, &report, path)
}

fn framework_report(method: &Method, path: &str, response: &Response) -> Option<ErrorReport> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return None;
    }

    let report = match status {
        StatusCode::NOT_FOUND => {
            AppError::NotFound(format!("No handler found for {method} {path}")).report()
        }
        StatusCode::METHOD_NOT_ALLOWED => AppError::MethodNotAllowed {
            method: method.to_string(),
            supported: allowed_methods(response.headers()),
        }
        .report(),
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::UploadSizeExceeded(UPLOAD_SIZE_EXCEEDED_MESSAGE.to_string()).report()
        }
        other => ErrorReport::new(
            other,
            other.canonical_reason().unwrap_or("Request failed"),
            Details::Request,
        ),
    };

    Some(report)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn allowed_methods(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::ALLOW)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

// Keeps the original headers (Allow, WWW-Authenticate, x-request-id, ...) and
// replaces status and body.
fn rebuild(response: Response, report: &ErrorReport, path: &str) -> Response {
    let (mut parts, _body) = response.into_parts();
    let api_error = report.render(Some(path));

    let (rendered, body) = (api_error.status, Json(api_error))
        .into_response()
        .into_parts();

    parts.status = rendered.status;
    parts.headers.remove(header::CONTENT_LENGTH);
    for (name, value) in &rendered.headers {
        parts.headers.insert(name.clone(), value.clone());
    }
    parts.extensions.insert(report.clone());

    Response::from_parts(parts, body)
}
