/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module が `apply(router, ...)` を持ち、app.rs が順番に重ねる
 */
pub mod auth;
pub mod cors;
pub mod error_boundary;
pub mod http;
pub mod security_headers;
