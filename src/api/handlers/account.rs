/*
 * Responsibility
 * - POST /api/account/signin (認証不要)
 * - DTO validation → AccountService → TokenResponse
 */
use axum::{Json, extract::State};

use crate::{
    api::{
        dto::account::{SignInRequest, TokenResponse},
        extractors::ApiJson,
    },
    error::AppError,
    state::AppState,
};

pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let issued = state
        .accounts
        .sign_in(req.username.trim(), &req.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: issued.token_type.to_string(),
        expires_in: issued.expires_in,
    }))
}
