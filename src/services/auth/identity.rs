use std::sync::Arc;

use uuid::Uuid;

use crate::repos::user_repo::{Identity, IdentityStore};
use crate::services::auth::error::AuthError;

/// Resolves a verified subject into the sanitized identity record.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, user_id: Uuid) -> Result<Identity, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)
    }
}
