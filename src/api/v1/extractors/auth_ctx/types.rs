/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックや users の参照は middleware/services 側の責務
 * - リクエスト単位の値。キャッシュしない、他のリクエストと共有しない
 */
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repos::user_repo::Identity;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `identity` は password hash を持たない Identity
/// - `expires_at` は access token の exp（ログ相関用）
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

impl AuthCtx {
    pub fn new(identity: Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            expires_at,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }
}
