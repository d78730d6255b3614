/**
 * Responsibility
 *  - core と types を束ねる
 *  - 外部（handlers 等）に公開する型を制御する
 */
mod core;
mod types;

pub use self::core::{PublicId, ResourceTag};
pub use self::types::*;
