use std::sync::Arc;

use crate::repos::user_repo::{Identity, IdentityStore};
use crate::services::auth::access_jwt::{TokenVerifier, VerifiedAccessToken};
use crate::services::auth::error::AuthError;
use crate::services::auth::identity::IdentityResolver;

const BEARER_PREFIX: &str = "Bearer ";

/// Result of a successful authentication: who is calling and until when the
/// credential is good.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub identity: Identity,
    pub token: VerifiedAccessToken,
}

/// Extract the token from an `Authorization` header value.
///
/// Missing header, a scheme other than `Bearer` and an empty token all mean
/// that no credential was presented.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let token = authorization
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(AuthError::Unauthenticated)?;

    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }
    Ok(token)
}

/// Verifier + resolver pipeline used by the access middleware.
#[derive(Clone)]
pub struct AuthService {
    verifier: TokenVerifier,
    resolver: IdentityResolver,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(verifier: TokenVerifier, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            verifier,
            resolver: IdentityResolver::new(identities),
        }
    }

    /// Authenticate one request from its raw `Authorization` header.
    ///
    /// Token checks are local and run first; the identity store is only
    /// consulted for a token that verified.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<Authenticated, AuthError> {
        let token = bearer_token(authorization)?;
        let verified = self.verifier.verify_verified(token)?;
        let identity = self.resolver.resolve(verified.user_id).await?;

        Ok(Authenticated {
            identity,
            token: verified,
        })
    }
}
