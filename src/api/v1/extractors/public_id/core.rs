/*
 * Responsibility
 * - Path の String を公開 ID 型として受け、復号して内部 ID に変換する
 * 置くもの
 *  - PublicId<T> の定義（ジェネリック本体）と FromRequestParts 実装
 *  - リソース名を持つ tag trait
 * 置かないもの
 *  - Listing などの具体リソース名 (types.rs)
 * エラー方針
 *  - 復号できない ID は「存在しない ID」として 404
 *  - Path 自体が取れない場合は 400
 */
use std::marker::PhantomData;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Marker for a resource addressed by a public id.
pub trait ResourceTag {
    /// Used in 404 bodies.
    const NAME: &'static str;
}

pub struct PublicId<T> {
    pub id: i64,
    _marker: PhantomData<T>,
}

impl<T> PublicId<T> {
    fn new(id: i64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for PublicId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PublicId<T> {}

impl<T> FromRequestParts<AppState> for PublicId<T>
where
    T: ResourceTag + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(public_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_PATH", "missing resource id"))?;

        let id = state.id_codec.decode(&public_id).map_err(|e| {
            tracing::debug!(error = %e, public_id = %public_id, "undecodable public id");
            AppError::not_found(T::NAME)
        })?;

        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for PublicId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicId").field("id", &self.id).finish()
    }
}
