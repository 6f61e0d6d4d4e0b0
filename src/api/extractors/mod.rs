/*
 * Responsibility
 * - axum 標準 extractor の rejection を AppError に変換する wrapper
 * - handler は Json/Query/Path の代わりにこれらを使う
 */
mod auth_ctx;
mod body;
mod params;
mod path;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use body::ApiJson;
pub use params::{ApiQuery, QueryParams};
pub use path::ApiPath;
