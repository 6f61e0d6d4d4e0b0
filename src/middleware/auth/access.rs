//! access token (JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - SecurityRules でパスごとの要求レベルを決める (first match wins)
//! - 有効な Bearer があれば、どのパスでも AuthCtx を載せる
//! - PermitAll のパスでは、無効なトークンは無視して匿名で通す
//! - 失敗は AppError (401 / 403) として返し、error boundary が envelope に整形する
//! - ステートレス: セッションも Cookie も使わない。毎リクエストで再認証する

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::auth::Access;
use crate::services::auth::AccessJwtError;
use crate::state::AppState;

/// Router 全体に認証を掛ける。fallback (未定義ルート) にも適用される。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

#[derive(Debug)]
enum Credential {
    Missing,
    Invalid(AccessJwtError),
}

impl Credential {
    fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing bearer token",
            Self::Invalid(err) => err.reason(),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthCtx, Credential> {
    let token = bearer_token(headers).ok_or(Credential::Missing)?;

    let verified = state
        .auth
        .verify_verified(token)
        .map_err(Credential::Invalid)?;

    Ok(AuthCtx::from(verified))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = original_uri.path();
    let access = state.rules.access_for(path);
    let outcome = authenticate(&state, req.headers());

    let auth_ctx = match (access, outcome) {
        (Access::PermitAll, Ok(ctx)) => Some(ctx),
        (Access::PermitAll, Err(credential)) => {
            if let Credential::Invalid(err) = &credential {
                tracing::debug!(path = %path, error = %err, "ignoring invalid token on permitted path");
            }
            None
        }
        (Access::Authenticated | Access::HasAuthority(_), Err(credential)) => {
            tracing::warn!(
                path = %path,
                reason = credential.reason(),
                "access token verification failed"
            );
            return Err(AppError::unauthorized(credential.reason()));
        }
        (Access::HasAuthority(authority), Ok(ctx)) if !ctx.has_authority(authority) => {
            tracing::warn!(
                path = %path,
                subject = %ctx.subject,
                authority = %authority,
                "missing authority"
            );
            return Err(AppError::access_denied(format!(
                "Missing authority {authority}"
            )));
        }
        (Access::Authenticated | Access::HasAuthority(_), Ok(ctx)) => Some(ctx),
    };

    // middleware → extractor への受け渡し
    if let Some(auth_ctx) = auth_ctx {
        req.extensions_mut().insert(auth_ctx);
    }

    Ok(next.run(req).await)
}
