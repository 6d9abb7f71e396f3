//! Directory operations over organizations, users, and plants. Thin record
//! storage behind the same authorization policy as everything else; the
//! interesting invariants live in `lifecycle` and `scoper`.

use market_client::domain::{
    NewOrganization, NewPowerPlant, NewUser, Organization, PowerPlant, User,
};

use crate::authz::{authorize, Action, ResourceScope, TenantScope};
use crate::error::ServiceError;
use crate::identity::{IdentityContext, Role};
use crate::store::DataStore;

/// Plant creation input; the owning organization is named, not numbered,
/// and resolved against the directory.
#[derive(Debug, Clone)]
pub struct PlantRequest {
    pub name: String,
    pub eic: String,
    pub installed_capacity: f64,
    pub fuel_type: String,
    pub organization_name: String,
    pub is_yekdem: bool,
    pub is_res: bool,
}

pub struct AssetDirectory<S> {
    store: S,
}

impl<S: DataStore> AssetDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_organization(
        &self,
        identity: &IdentityContext,
        new: NewOrganization,
    ) -> Result<Organization, ServiceError> {
        authorize(identity, Action::ManageOrganizations, ResourceScope::Any).into_scope()?;
        let organization = self.store.insert_organization(new).await?;
        tracing::info!(organization_id = organization.id, "organization created");
        Ok(organization)
    }

    pub async fn list_organizations(
        &self,
        identity: &IdentityContext,
    ) -> Result<Vec<Organization>, ServiceError> {
        authorize(identity, Action::ManageOrganizations, ResourceScope::Any).into_scope()?;
        Ok(self.store.list_organizations().await?)
    }

    pub async fn create_user(
        &self,
        identity: &IdentityContext,
        new: NewUser,
    ) -> Result<User, ServiceError> {
        authorize(identity, Action::ManageUsers, ResourceScope::Any).into_scope()?;

        if Role::parse(&new.role).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "unknown role: {}",
                new.role
            )));
        }
        if self
            .store
            .find_organization(new.organization_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound);
        }

        let user = self.store.insert_user(new).await?;
        tracing::info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn list_users(
        &self,
        identity: &IdentityContext,
    ) -> Result<Vec<User>, ServiceError> {
        authorize(identity, Action::ManageUsers, ResourceScope::Any).into_scope()?;
        Ok(self.store.list_users().await?)
    }

    pub async fn create_plant(
        &self,
        identity: &IdentityContext,
        request: PlantRequest,
    ) -> Result<PowerPlant, ServiceError> {
        authorize(identity, Action::CreatePlant, ResourceScope::Any).into_scope()?;

        if request.installed_capacity <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "installed capacity must be positive".to_string(),
            ));
        }
        let Some(organization) = self
            .store
            .find_organization_by_name(&request.organization_name)
            .await?
        else {
            return Err(ServiceError::NotFound);
        };

        let plant = self
            .store
            .insert_plant(NewPowerPlant {
                name: request.name,
                eic: request.eic,
                installed_capacity: request.installed_capacity,
                fuel_type: request.fuel_type,
                is_yekdem: request.is_yekdem,
                is_res: request.is_res,
                organization_id: organization.id,
            })
            .await?;
        tracing::info!(plant_id = plant.id, organization_id = organization.id, "power plant created");
        Ok(plant)
    }

    /// Plants visible to the caller, optionally narrowed to one
    /// organization. The explicit filter is validated against the caller's
    /// tenant like any other named resource.
    pub async fn list_plants(
        &self,
        identity: &IdentityContext,
        organization_id: Option<i64>,
    ) -> Result<Vec<PowerPlant>, ServiceError> {
        let scope = authorize(identity, Action::ListPlants, ResourceScope::Any).into_scope()?;

        if let Some(org) = organization_id {
            authorize(identity, Action::ListPlants, ResourceScope::OwnedBy(org)).into_scope()?;
        }

        let filter = match scope {
            TenantScope::Unrestricted => organization_id,
            TenantScope::RestrictedTo(org) => Some(org),
        };
        Ok(self.store.list_plants(filter).await?)
    }
}
