/*
 * Responsibility
 * - /api/admin/users 配下 (ROLE_ADMIN 必須: SecurityRules 側で判定)
 * - query / path の変換エラーは extractor が AppError にする
 */
use axum::{Json, extract::State};

use crate::{
    api::{
        dto::admin::{UserListQuery, UserSummary},
        extractors::{ApiPath, ApiQuery, QueryParams},
    },
    error::AppError,
    services::account::DEFAULT_PAGE_SIZE,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state
        .accounts
        .list_users(
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// `GET /api/admin/user-search?prefix=al&limit=10`
pub async fn search_users(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let prefix = params.required("prefix")?;
    let limit = params.parse::<usize>("limit")?.unwrap_or(DEFAULT_PAGE_SIZE);

    let users = state.accounts.search_users(prefix, limit).await?;

    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state.accounts.find_user(&username).await?;

    Ok(Json(user.into()))
}
