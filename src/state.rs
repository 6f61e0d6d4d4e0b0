/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: トークン検証, accounts: サインイン, rules: 認証ゲートのルール
 * - Clone 前提で持つ (内部は Arc / 起動後は不変)
 */
use std::sync::Arc;

use crate::middleware::auth::SecurityRules;
use crate::services::{account::AccountService, auth::AccessTokenVerifier};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AccessTokenVerifier>,
    pub accounts: Arc<AccountService>,
    pub rules: Arc<SecurityRules>,
}

impl AppState {
    pub fn new(
        auth: Arc<AccessTokenVerifier>,
        accounts: Arc<AccountService>,
        rules: Arc<SecurityRules>,
    ) -> Self {
        Self {
            auth,
            accounts,
            rules,
        }
    }
}
