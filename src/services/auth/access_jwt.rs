use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("invalid 'sub' (expected UUID)")]
    InvalidSubUuid,
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - the login service historically put the user id in `id`; `sub` is accepted as well.
/// - `exp` presence and value are enforced by `Validation`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(alias = "id")]
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// TokenVerifier が返す「検証済み・アプリ側で使う型」
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccessToken {
    pub user_id: Uuid,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// HS256 access-token verifier.
///
/// The secret is injected at construction so tests can run verifiers with
/// distinct secrets side by side. Key material is not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    // Verify signature + expiry and decode the claims.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify, then convert the claims into an application-friendly type.
    ///
    /// This is the entry-point for the auth service. Subjects are parsed as
    /// UUIDs here, so later comparisons never depend on the textual form
    /// (case, braces) the issuer used.
    pub fn verify_verified(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify(token)?;

        let sub = claims.sub.trim();
        if sub.is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        let user_id = Uuid::parse_str(sub).map_err(|_| AccessJwtError::InvalidSubUuid)?;

        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(AccessJwtError::EmptyClaim("exp"))?;
        let issued_at = claims
            .iat
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(VerifiedAccessToken {
            user_id,
            issued_at,
            expires_at,
        })
    }
}
