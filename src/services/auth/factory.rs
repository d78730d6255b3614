/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::user_repo::IdentityStore;
use crate::services::auth::{AuthService, TokenVerifier};

pub fn build_auth_service(config: &Config, identities: Arc<dyn IdentityStore>) -> Arc<AuthService> {
    let verifier = TokenVerifier::new(
        config.jwt_secret.as_bytes(),
        config.access_token_leeway_seconds,
    );

    Arc::new(AuthService::new(verifier, identities))
}
