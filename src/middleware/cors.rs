//! CORS policy for browser clients of the gateway.
//!
//! - Clients authenticate with `Authorization: Bearer`, never cookies, so the
//!   policy never enables credentials mode.
//! - Development: any origin. Production: only `CORS_ALLOWED_ORIGINS`; an empty
//!   list answers no cross-origin request.
//! - `Authorization` and `Content-Type` are allowed request headers (sign-in posts JSON).
//! - `WWW-Authenticate` is exposed so a script can read the Bearer challenge on a 401.
//! - `x-request-id` is allowed in both directions for correlating error envelopes
//!   with server logs.
//!
//! Applied outermost, so preflight requests are answered before the auth gate
//! and never receive a 401.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Wildcard origin (`Any`) must not be combined with `allow_credentials(true)`.
pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        // An empty allowlist allows none (no CORS headers).
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new().allow_origin(allow_origin)
    } else {
        CorsLayer::new().allow_origin(Any)
    }
    // The gateway only routes GET and POST
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .expose_headers([
        header::WWW_AUTHENTICATE,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
