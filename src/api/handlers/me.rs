/*
 * Responsibility
 * - GET /api/me: 認証済み主体をそのまま返す
 */
use axum::Json;

use crate::api::extractors::{AuthCtx, AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<AuthCtx> {
    Json(ctx)
}
