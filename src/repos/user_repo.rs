/*
 * Responsibility
 * - users テーブルの読み取り (認証済み主体の解決用)
 * - password hash は SELECT しない (projection で除外)
 * - 書き込み (登録 / login) はこの service の責務外
 */
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoResult;

/// A user as seen by request handlers.
///
/// The type has no password hash field, so nothing holding an `Identity` can
/// leak it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    #[sqlx(rename = "firstName")]
    pub first_name: String,
    #[sqlx(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[sqlx(rename = "profileImagePath")]
    pub profile_image_path: Option<String>,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Sanitized lookup by id. `None` when the account no longer exists.
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Identity>>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgUserRepo {
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Identity>> {
        let row = sqlx::query_as::<_, Identity>(
            r#"
            SELECT "userId", "firstName", "lastName", email, "profileImagePath"
            FROM users
            WHERE "userId" = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
