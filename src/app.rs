/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS / security headers / error boundary / HTTP / 認証ゲート)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::middleware::auth::SecurityRules;
use crate::services::auth::{build_account_service, build_auth_service};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG があればそれを優先
    // Ex:
    // RUST_LOG=info,contacts_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast / production: default hook (stderr) のみ
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

fn build_state(config: &Config) -> Result<AppState> {
    let auth = build_auth_service(config);
    let accounts = build_account_service(config)?;
    let rules = Arc::new(SecurityRules::standard(
        &config.auth_permit_patterns,
        &config.auth_authority_rules,
    ));

    Ok(AppState::new(auth, accounts, rules))
}

// 外側ほど先に通る: cors → security headers → error boundary → http → 認証ゲート → routes
fn build_router(state: AppState, config: &Config) -> Router {
    let router = middleware::auth::access::apply(api::routes(), state.clone()).with_state(state);

    let router = middleware::http::apply(router, config);
    let router = middleware::error_boundary::apply(router);
    let router = middleware::security_headers::apply(router);
    middleware::cors::apply(router, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tower::ServiceExt;

    use crate::services::auth::JwtIssuer;

    const SECRET: &str = "test-secret-test-secret-test-secret-0123";

    fn config_with(extra: &[(&'static str, &'static str)]) -> Config {
        let mut env: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", SECRET),
            ("MAX_UPLOAD_BYTES", "256"),
            ("BOOTSTRAP_ADMIN_USERNAME", "admin"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "s3cret-pass"),
        ]);
        env.extend(extra.iter().copied());
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).expect("config")
    }

    fn app_with(extra: &[(&'static str, &'static str)]) -> Router {
        let config = config_with(extra);
        let state = build_state(&config).expect("state");
        build_router(state, &config)
    }

    fn test_app() -> Router {
        app_with(&[])
    }

    fn token_for(subject: &str, roles: &[&str]) -> String {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        JwtIssuer::new(SECRET.as_bytes(), None, 300)
            .issue_access_token(subject, &roles)
            .expect("issue token")
            .access_token
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).expect("request")
    }

    fn sign_in_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/account/signin")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn assert_envelope(body: &Value, status: u16) {
        assert_eq!(body["status"], status);
        assert!(body["timestamp"].is_string());
        assert!(body["message"].is_string());
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let response = test_app().oneshot(get("/health", None)).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_allow_listed_paths_skip_authentication() {
        for path in ["/", "/favicon.ico", "/index.html", "/static/app.js"] {
            let response = test_app().oneshot(get(path, None)).await.expect("response");

            // nothing is served there, but the gate let it through
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
            let body = body_json(response).await;
            assert_envelope(&body, 404);
            assert_eq!(body["message"], format!("No handler found for GET {path}"));
        }
    }

    #[tokio::test]
    async fn test_protected_path_without_token_is_401() {
        let response = test_app().oneshot(get("/api/me", None)).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
        assert!(response.headers().get("x-request-id").is_some());
        assert_eq!(
            response
                .headers()
                .get("x-content-type-options")
                .and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );

        let body = body_json(response).await;
        assert_envelope(&body, 401);
        assert_eq!(
            body["message"],
            "Full authentication is required to access this resource"
        );
    }

    #[tokio::test]
    async fn test_garbage_token_is_401() {
        let response = test_app()
            .oneshot(get("/api/me", Some("not-a-jwt")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_envelope(&body_json(response).await, 401);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_401() {
        let forged = JwtIssuer::new(b"another-secret-another-secret-0000", None, 300)
            .issue_access_token("mallory", &[])
            .expect("issue token")
            .access_token;

        let response = test_app()
            .oneshot(get("/api/me", Some(&forged)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let token = token_for("alice", &["ROLE_USER"]);
        let response = test_app()
            .oneshot(get("/api/me", Some(&token)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["subject"], "alice");
        assert_eq!(body["authorities"], json!(["ROLE_USER"]));
    }

    #[tokio::test]
    async fn test_invalid_token_on_open_path_is_ignored() {
        let response = test_app()
            .oneshot(get("/health", Some("not-a-jwt")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_sign_in_then_call_protected_endpoint() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(sign_in_request(
                json!({"username": "admin", "password": "s3cret-pass"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 3600);
        let token = body["access_token"].as_str().expect("token").to_string();

        let response = app
            .oneshot(get("/api/me", Some(&token)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["subject"], "admin");
        assert_eq!(body["authorities"], json!(["ROLE_ADMIN", "ROLE_USER"]));
    }

    #[tokio::test]
    async fn test_wrong_password_is_bad_credentials() {
        let response = test_app()
            .oneshot(sign_in_request(
                json!({"username": "admin", "password": "nope"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_envelope(&body, 400);
        assert_eq!(body["message"], "Bad credentials");
        assert_eq!(body["details"], "uri=/api/account/signin");
    }

    #[tokio::test]
    async fn test_blank_username_is_validation_error() {
        let response = test_app()
            .oneshot(sign_in_request(json!({"username": " ", "password": "x"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "username is required");
    }

    #[tokio::test]
    async fn test_sign_in_with_text_body_is_415() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/account/signin")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("admin:s3cret-pass"))
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = body_json(response).await;
        assert_envelope(&body, 415);
        assert_eq!(body["message"], "Content type 'text/plain' is not supported");
    }

    #[tokio::test]
    async fn test_oversized_body_is_417() {
        let padding = "x".repeat(1024);
        let response = test_app()
            .oneshot(sign_in_request(
                json!({"username": "admin", "password": padding}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
        let body = body_json(response).await;
        assert_envelope(&body, 417);
        assert_eq!(body["message"], "Maximum upload size exceeded");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_405() {
        let token = token_for("alice", &["ROLE_USER"]);
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");

        let response = test_app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_envelope(&body, 405);
        assert_eq!(body["message"], "Request method 'DELETE' is not supported");
    }

    #[tokio::test]
    async fn test_unknown_protected_path_with_token_is_404() {
        let token = token_for("alice", &[]);
        let response = test_app()
            .oneshot(get("/api/nope", Some(&token)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "No handler found for GET /api/nope");
        assert_eq!(body["details"], "uri=/api/nope");
    }

    #[tokio::test]
    async fn test_configured_authority_rule_is_403_without_authority() {
        let app = app_with(&[("AUTH_AUTHORITY_RULES", "/api/me=ROLE_AUDITOR")]);

        let token = token_for("alice", &["ROLE_USER"]);
        let response = app
            .clone()
            .oneshot(get("/api/me", Some(&token)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_envelope(&body, 403);
        assert_eq!(
            body["message"],
            "You are not authorized to access this resource!"
        );
        assert_eq!(body["details"], "Missing authority ROLE_AUDITOR");

        let auditor = token_for("bob", &["ROLE_AUDITOR"]);
        let response = app
            .oneshot(get("/api/me", Some(&auditor)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_routes_need_admin_authority() {
        let user = token_for("alice", &["ROLE_USER"]);
        let response = test_app()
            .oneshot(get("/api/admin/users", Some(&user)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = test_app()
            .oneshot(get("/api/admin/users", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_lists_and_finds_users() {
        let app = test_app();
        let admin = token_for("admin", &["ROLE_ADMIN"]);

        let response = app
            .clone()
            .oneshot(get("/api/admin/users?limit=10", Some(&admin)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["username"], "admin");
        assert!(body[0].get("password_hash").is_none());

        let response = app
            .clone()
            .oneshot(get("/api/admin/user-search?prefix=adm", Some(&admin)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await[0]["username"], "admin");

        let response = app
            .oneshot(get("/api/admin/users/admin", Some(&admin)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["authorities"],
            json!(["ROLE_ADMIN", "ROLE_USER"])
        );
    }

    #[tokio::test]
    async fn test_admin_unknown_user_is_404() {
        let admin = token_for("admin", &["ROLE_ADMIN"]);
        let response = test_app()
            .oneshot(get("/api/admin/users/ghost", Some(&admin)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "User ghost not found");
        assert_eq!(body["details"], "uri=/api/admin/users/ghost");
    }

    #[tokio::test]
    async fn test_bad_typed_query_is_constraint_violation() {
        let admin = token_for("admin", &["ROLE_ADMIN"]);
        let response = test_app()
            .oneshot(get("/api/admin/users?limit=lots", Some(&admin)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_envelope(&body, 400);
        assert_eq!(body["details"], "uri=/api/admin/users");
    }

    #[tokio::test]
    async fn test_missing_query_parameter_is_named() {
        let admin = token_for("admin", &["ROLE_ADMIN"]);
        let response = test_app()
            .oneshot(get("/api/admin/user-search", Some(&admin)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_envelope(&body, 400);
        assert_eq!(body["message"], "Parameter prefix is missing");
    }

    #[tokio::test]
    async fn test_unparsable_query_parameter_is_type_mismatch() {
        let admin = token_for("admin", &["ROLE_ADMIN"]);
        let response = test_app()
            .oneshot(get(
                "/api/admin/user-search?prefix=a&limit=lots",
                Some(&admin),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = body_json(response).await;
        assert_envelope(&body, 415);
        assert_eq!(body["message"], "limit should be of type usize");
    }

    #[tokio::test]
    async fn test_unknown_user_sign_in_is_bad_credentials() {
        let response = test_app()
            .oneshot(sign_in_request(
                json!({"username": "nobody", "password": "s3cret-pass"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Bad credentials");
    }

    #[tokio::test]
    async fn test_repeated_requests_get_same_outcome() {
        let app = test_app();
        let mut seen = Vec::new();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get("/api/me", None))
                .await
                .expect("response");
            let status = response.status();
            let body = body_json(response).await;
            seen.push((status, body["message"].clone(), body["details"].clone()));
        }

        assert_eq!(seen[0], seen[1]);
    }
}
