/*
 * Responsibility
 * - /api/admin の request/response DTO
 * - password_hash は response に含めない
 */
use serde::{Deserialize, Serialize};

use crate::services::users::UserRecord;

/// `GET /api/admin/users?offset=&limit=`
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub authorities: Vec<String>,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            authorities: user.authorities,
        }
    }
}
