/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - access middleware が付与した AuthCtx を handler に渡す (token の再検証はしない)
 * - axum 依存は core に、型定義は types に分離する
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
