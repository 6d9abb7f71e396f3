//! Authentication seam. Credential issuance and verification belong to the
//! external authentication service; the core only needs something that
//! turns an opaque token into a verified [`IdentityContext`] or refuses.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::identity::{IdentityContext, Role};
use crate::store::DataStore;

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a credential token to a verified identity, or fail the
    /// request with `Unauthenticated` before any business logic runs.
    async fn resolve_identity(&self, token: &str) -> Result<IdentityContext, ServiceError>;
}

/// Resolves tokens by exact credential match against the user table.
#[derive(Clone)]
pub struct StoreAuthenticator<S> {
    store: S,
}

impl<S> StoreAuthenticator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DataStore> Authenticator for StoreAuthenticator<S> {
    async fn resolve_identity(&self, token: &str) -> Result<IdentityContext, ServiceError> {
        let Some(user) = self.store.find_user_by_credential(token).await? else {
            return Err(ServiceError::Unauthenticated);
        };

        let Some(role) = Role::parse(&user.role) else {
            tracing::warn!(user_id = user.id, role = %user.role, "user row carries an unknown role");
            return Err(ServiceError::Unauthenticated);
        };

        Ok(IdentityContext {
            user_id: user.id,
            role,
            organization_id: user.organization_id,
        })
    }
}
