use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::access_jwt::AccessJwtError;

/// Why a request could not be authenticated.
///
/// Everything except `Store` is a client problem and ends the request with 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer credential presented")]
    Unauthenticated,
    #[error("invalid credential: {0}")]
    InvalidCredential(#[source] AccessJwtError),
    #[error("identity for verified subject no longer exists")]
    IdentityNotFound,
    #[error(transparent)]
    Store(#[from] RepoError),
}

impl From<AccessJwtError> for AuthError {
    fn from(e: AccessJwtError) -> Self {
        Self::InvalidCredential(e)
    }
}
