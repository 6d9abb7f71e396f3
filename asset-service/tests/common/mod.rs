//! Shared fixtures for the integration suites: two tenants, one plant
//! each, one identity per role, and a trigger double that counts calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use market_client::domain::{NewOrganization, NewPowerPlant, Organization, PowerPlant};

use asset_service::identity::{IdentityContext, Role};
use asset_service::lifecycle::EventLifecycle;
use asset_service::store::{DataStore, MemoryStore};
use asset_service::trigger::{SimulationTrigger, TriggerError};

/// Trigger double: counts invocations and optionally fails each one.
#[derive(Clone, Default)]
pub struct RecordingTrigger {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingTrigger {
    pub fn failing() -> Self {
        RecordingTrigger {
            calls: Arc::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimulationTrigger for RecordingTrigger {
    async fn recompute_hourly_energy_data(&self) -> Result<(), TriggerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(TriggerError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

pub struct Fixture {
    pub store: MemoryStore,
    pub org_a: Organization,
    pub org_b: Organization,
    pub plant_a: PowerPlant,
    pub plant_b: PowerPlant,
    pub root: IdentityContext,
    pub admin_a: IdentityContext,
    pub analyst_a: IdentityContext,
    pub admin_b: IdentityContext,
}

/// Two organizations with one 100 MW plant each.
pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();

    let org_a = store
        .insert_organization(NewOrganization {
            name: "acme energy".to_string(),
            eic: "ORG-A".to_string(),
        })
        .await
        .expect("seed org a");
    let org_b = store
        .insert_organization(NewOrganization {
            name: "globex power".to_string(),
            eic: "ORG-B".to_string(),
        })
        .await
        .expect("seed org b");

    let plant_a = store
        .insert_plant(NewPowerPlant {
            name: "river hydro".to_string(),
            eic: "PP-A".to_string(),
            installed_capacity: 100.0,
            fuel_type: "hydro".to_string(),
            is_yekdem: false,
            is_res: true,
            organization_id: org_a.id,
        })
        .await
        .expect("seed plant a");
    let plant_b = store
        .insert_plant(NewPowerPlant {
            name: "coastal wind".to_string(),
            eic: "PP-B".to_string(),
            installed_capacity: 100.0,
            fuel_type: "wind".to_string(),
            is_yekdem: true,
            is_res: true,
            organization_id: org_b.id,
        })
        .await
        .expect("seed plant b");

    let root = IdentityContext {
        user_id: 1,
        role: Role::SuperAdmin,
        organization_id: org_a.id,
    };
    let admin_a = IdentityContext {
        user_id: 2,
        role: Role::Admin,
        organization_id: org_a.id,
    };
    let analyst_a = IdentityContext {
        user_id: 3,
        role: Role::Analyst,
        organization_id: org_a.id,
    };
    let admin_b = IdentityContext {
        user_id: 4,
        role: Role::Admin,
        organization_id: org_b.id,
    };

    Fixture {
        store,
        org_a,
        org_b,
        plant_a,
        plant_b,
        root,
        admin_a,
        analyst_a,
        admin_b,
    }
}

/// Lifecycle over the fixture store with a fresh counting trigger.
pub fn lifecycle(fx: &Fixture) -> EventLifecycle<MemoryStore, RecordingTrigger> {
    EventLifecycle::new(fx.store.clone(), RecordingTrigger::default())
}
