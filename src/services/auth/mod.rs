pub mod access_jwt;
pub mod error;
pub mod factory;
pub mod identity;
pub mod ownership;
pub mod service;

pub use access_jwt::{TokenVerifier, VerifiedAccessToken};
pub use error::AuthError;
pub use factory::build_auth_service;
pub use identity::IdentityResolver;
pub use ownership::{AccessDecision, Mutation, Owned};
pub use service::{AuthService, Authenticated};
