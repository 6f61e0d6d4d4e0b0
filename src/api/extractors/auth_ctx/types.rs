/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - リクエストごとに生成され、リクエストと一緒に破棄される (キャッシュしない)
 */
use serde::Serialize;

use crate::services::auth::VerifiedAccessToken;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject` はトークンの `sub` (ユーザー名)
/// - `authorities` は `ROLE_*` 形式の coarse-grained な権限
/// - `token_id` は監査/相関用の `jti`
#[derive(Debug, Clone, Serialize)]
pub struct AuthCtx {
    pub subject: String,
    pub authorities: Vec<String>,
    pub token_id: Option<String>,
}

impl AuthCtx {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

impl From<VerifiedAccessToken> for AuthCtx {
    fn from(token: VerifiedAccessToken) -> Self {
        Self {
            subject: token.subject,
            authorities: token.authorities,
            token_id: token.token_id,
        }
    }
}
