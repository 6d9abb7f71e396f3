//! Role and tenant authorization.
//!
//! Every permission question in the service goes through [`authorize`], so
//! the existence-concealment rule (cross-tenant targets answer exactly like
//! missing ones) lives in one place instead of being repeated per endpoint.

use crate::error::ServiceError;
use crate::identity::{IdentityContext, Role};

/// Capability classes a caller may exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageOrganizations,
    ManageUsers,
    CreatePlant,
    ListPlants,
    /// Resolve a plant the caller named explicitly.
    ViewPlant,
    ListGeneration,
    StartEvent,
    FinishEvent,
    ListEvents,
    ReadMarketFeed,
}

/// Explicit target named by the caller, already resolved against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// No explicit resource filter supplied.
    Any,
    /// The named resource does not exist.
    Missing,
    /// The named resource belongs to this organization.
    OwnedBy(i64),
}

/// Tenant restriction to apply to the query that follows an allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    Unrestricted,
    RestrictedTo(i64),
}

impl TenantScope {
    /// Organization filter to hand to the data store.
    pub fn organization_filter(self) -> Option<i64> {
        match self {
            TenantScope::Unrestricted => None,
            TenantScope::RestrictedTo(org) => Some(org),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Forbidden,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(TenantScope),
    Denied(DenyReason),
}

impl Decision {
    /// Unwrap an allow, mapping a deny to the matching request error.
    pub fn into_scope(self) -> Result<TenantScope, ServiceError> {
        match self {
            Decision::Allowed(scope) => Ok(scope),
            Decision::Denied(DenyReason::Forbidden) => Err(ServiceError::Forbidden),
            Decision::Denied(DenyReason::NotFound) => Err(ServiceError::NotFound),
        }
    }
}

fn permits(role: Role, action: Action) -> bool {
    match action {
        Action::ManageOrganizations | Action::ManageUsers | Action::CreatePlant => {
            role == Role::SuperAdmin
        }
        Action::StartEvent | Action::FinishEvent => role != Role::Analyst,
        Action::ListPlants
        | Action::ViewPlant
        | Action::ListGeneration
        | Action::ListEvents
        | Action::ReadMarketFeed => true,
    }
}

/// Decide whether `identity` may perform `action` on `resource`, and under
/// which tenant scope the resulting query must run.
///
/// `super_admin` is exempt from tenant scoping; a `Missing` resource is
/// `NotFound` even for it. Every other role is pinned to its own
/// organization, and a target outside that organization is answered with
/// `NotFound`, indistinguishable from a target that does not exist.
pub fn authorize(identity: &IdentityContext, action: Action, resource: ResourceScope) -> Decision {
    if !permits(identity.role, action) {
        return Decision::Denied(DenyReason::Forbidden);
    }

    if identity.role == Role::SuperAdmin {
        return match resource {
            ResourceScope::Missing => Decision::Denied(DenyReason::NotFound),
            ResourceScope::Any | ResourceScope::OwnedBy(_) => {
                Decision::Allowed(TenantScope::Unrestricted)
            }
        };
    }

    match resource {
        ResourceScope::Any => {
            Decision::Allowed(TenantScope::RestrictedTo(identity.organization_id))
        }
        ResourceScope::OwnedBy(org) if org == identity.organization_id => {
            Decision::Allowed(TenantScope::RestrictedTo(org))
        }
        ResourceScope::Missing | ResourceScope::OwnedBy(_) => {
            Decision::Denied(DenyReason::NotFound)
        }
    }
}
