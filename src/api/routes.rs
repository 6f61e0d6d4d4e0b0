/*
 * Responsibility
 * - URL 構造を定義
 * - 認証・認可が必要な範囲は routes ではなく SecurityRules (middleware::auth) が決める
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::handlers::{account::sign_in, admin, health::health, me::me};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/account/signin", post(sign_in))
        .route("/api/me", get(me))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{username}", get(admin::get_user))
        .route("/api/admin/user-search", get(admin::search_users))
}
