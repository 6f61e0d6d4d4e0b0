//! Response headers for a JSON-only API that serves bearer-protected data.
//!
//! Applied outside the error boundary, so 401/403/404 envelopes get them too.
//! Every header is set only when the handler did not set it.
//!
//! - No response is meant to be framed: `x-frame-options: DENY` plus CSP
//!   `frame-ancestors 'none'` for newer browsers.
//! - Bodies are always `application/json`; `nosniff` keeps browsers from
//!   reinterpreting an error envelope as script or HTML.
//! - Request URLs can carry usernames (`/api/admin/users/{username}`), so no referrer.
//! - `Cache-Control: no-store` keeps responses that depend on the caller's
//!   token (`/api/me`, sign-in tokens) out of shared and browser caches.

use axum::Router;
use axum::http::header::{CACHE_CONTROL, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub fn apply(router: Router) -> Router {
    router
        // Clickjacking protection (legacy + modern)
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static("frame-ancestors 'none'"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}
