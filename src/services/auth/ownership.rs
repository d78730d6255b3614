//! Single-owner write access.
//!
//! Mutation handlers load the target first and hand the `Option` to [`decide`].
//! The only way to get the resource back out is an `Authorized` decision, so a
//! mutation can not be applied before existence and ownership are settled, and
//! a missing resource never reaches the ownership comparison.

use uuid::Uuid;

use crate::error::AppError;

/// A resource with a single, immutable owner.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// What a guarded mutation is trying to do; used in the 403 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AccessDecision<R> {
    NotFound,
    Forbidden { owner_id: Uuid },
    Authorized(R),
}

/// Existence first, then ownership.
pub fn decide<R: Owned>(resource: Option<R>, actor_id: Uuid) -> AccessDecision<R> {
    match resource {
        None => AccessDecision::NotFound,
        Some(r) if r.owner_id() != actor_id => AccessDecision::Forbidden {
            owner_id: r.owner_id(),
        },
        Some(r) => AccessDecision::Authorized(r),
    }
}

impl<R> AccessDecision<R> {
    pub fn into_result(self, resource: &'static str, mutation: Mutation) -> Result<R, AppError> {
        match self {
            AccessDecision::Authorized(r) => Ok(r),
            AccessDecision::NotFound => Err(AppError::not_found(resource)),
            AccessDecision::Forbidden { .. } => Err(AppError::forbidden(format!(
                "you do not have permission to {} this {}",
                mutation.verb(),
                resource
            ))),
        }
    }
}

/// Guard a loaded resource for `actor_id`, logging denials.
pub fn authorize<R: Owned>(
    resource: Option<R>,
    actor_id: Uuid,
    resource_name: &'static str,
    mutation: Mutation,
) -> Result<R, AppError> {
    let decision = decide(resource, actor_id);
    if let AccessDecision::Forbidden { owner_id } = &decision {
        tracing::warn!(
            actor_id = %actor_id,
            owner_id = %owner_id,
            resource = resource_name,
            mutation = ?mutation,
            "ownership check failed"
        );
    }
    decision.into_result(resource_name, mutation)
}
