/*
 * Responsibility
 * - 認証ゲート: SecurityRules の評価 → Bearer 検証 → AuthCtx 付与
 */
pub mod access;
pub mod rules;

pub use rules::{Access, SecurityRules};
