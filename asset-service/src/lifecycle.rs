//! Plant-event lifecycle: Active -> Open(Maintenance | Failure) -> Active.
//!
//! A plant's `current_status` is a materialized projection of its open
//! event; both are written in the same store transaction, so the pair is
//! atomic from the caller's perspective. The simulation trigger runs only
//! after that commit and its failure is swallowed.

use market_client::domain::{NewPlantEvent, PlantEventDetail};
use serde::Serialize;
use time::OffsetDateTime;

use crate::authz::{authorize, Action, ResourceScope};
use crate::error::ServiceError;
use crate::identity::IdentityContext;
use crate::store::DataStore;
use crate::trigger::SimulationTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Maintenance,
    Failure,
}

impl EventType {
    /// Stored string, also mirrored into the plant's `current_status`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Maintenance => "Maintenance",
            EventType::Failure => "Failure",
        }
    }
}

/// Event row as presented to callers; `status` is derived from `end_time`
/// at listing time, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct PlantEventSummary {
    pub id: i64,
    pub plant_name: String,
    pub event_type: String,
    pub status: &'static str,
    pub affected_capacity: f64,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub reason: String,
    pub description: Option<String>,
}

impl From<PlantEventDetail> for PlantEventSummary {
    fn from(detail: PlantEventDetail) -> Self {
        let status = if detail.end_time.is_none() {
            "continue"
        } else {
            "completed"
        };
        PlantEventSummary {
            id: detail.id,
            plant_name: detail.plant_name,
            event_type: detail.event_type,
            status,
            affected_capacity: detail.affected_capacity,
            start_time: detail.start_time,
            end_time: detail.end_time,
            reason: detail.reason,
            description: detail.description,
        }
    }
}

pub struct EventLifecycle<S, T> {
    store: S,
    trigger: T,
}

impl<S, T> EventLifecycle<S, T>
where
    S: DataStore,
    T: SimulationTrigger,
{
    pub fn new(store: S, trigger: T) -> Self {
        Self { store, trigger }
    }

    /// Open a maintenance or failure event on a plant and mirror the plant
    /// status to the event type. Returns the new event's id.
    pub async fn start(
        &self,
        identity: &IdentityContext,
        power_plant_id: i64,
        event_type: EventType,
        reason: String,
        description: Option<String>,
        affected_capacity: f64,
        now: OffsetDateTime,
    ) -> Result<i64, ServiceError> {
        let plant = self.store.find_plant(power_plant_id).await?;
        let resource = plant
            .as_ref()
            .map_or(ResourceScope::Missing, |p| {
                ResourceScope::OwnedBy(p.organization_id)
            });
        // Visibility before capability: a plant the caller cannot see stays
        // a NotFound even for roles that could not mutate it anyway.
        authorize(identity, Action::ViewPlant, resource).into_scope()?;
        authorize(identity, Action::StartEvent, ResourceScope::Any).into_scope()?;

        let Some(plant) = plant else {
            return Err(ServiceError::NotFound);
        };

        if self.store.find_open_event(power_plant_id).await?.is_some() {
            return Err(ServiceError::Conflict(
                "an open event already exists for this plant".to_string(),
            ));
        }

        if affected_capacity <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "affected capacity must be positive".to_string(),
            ));
        }
        if affected_capacity > plant.installed_capacity {
            return Err(ServiceError::InvalidInput(format!(
                "affected capacity ({affected_capacity}) cannot exceed the plant's installed capacity ({})",
                plant.installed_capacity
            )));
        }

        // The atomic insert re-checks the open-event invariant; racing
        // callers lose with a Conflict here.
        let event = self
            .store
            .begin_event(NewPlantEvent {
                power_plant_id,
                event_type: event_type.as_str().to_string(),
                reason,
                description,
                affected_capacity,
                start_time: now,
            })
            .await?;

        tracing::info!(
            event_id = event.id,
            plant_id = power_plant_id,
            event_type = event_type.as_str(),
            "plant event opened"
        );
        self.notify_trigger().await;
        Ok(event.id)
    }

    /// Conclude an open event and return the plant to Active.
    pub async fn finish(
        &self,
        identity: &IdentityContext,
        event_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), ServiceError> {
        let Some(event) = self.store.find_event(event_id).await? else {
            return Err(ServiceError::NotFound);
        };

        authorize(identity, Action::FinishEvent, ResourceScope::Any).into_scope()?;

        let plant = self.store.find_plant(event.power_plant_id).await?;
        let resource = plant
            .as_ref()
            .map_or(ResourceScope::Missing, |p| {
                ResourceScope::OwnedBy(p.organization_id)
            });
        authorize(identity, Action::ViewPlant, resource).into_scope()?;

        if event.end_time.is_some() {
            return Err(ServiceError::Conflict(
                "event already concluded".to_string(),
            ));
        }

        self.store.conclude_event(event_id, now).await?;

        tracing::info!(
            event_id,
            plant_id = event.power_plant_id,
            "plant event concluded"
        );
        self.notify_trigger().await;
        Ok(())
    }

    /// List events visible to the caller, newest first, annotated with the
    /// derived continue/completed status.
    pub async fn list(
        &self,
        identity: &IdentityContext,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<PlantEventSummary>, ServiceError> {
        let scope = authorize(identity, Action::ListEvents, ResourceScope::Any).into_scope()?;

        if let Some(plant_id) = power_plant_id {
            let resource = match self.store.find_plant(plant_id).await? {
                None => ResourceScope::Missing,
                Some(plant) => ResourceScope::OwnedBy(plant.organization_id),
            };
            authorize(identity, Action::ViewPlant, resource).into_scope()?;
        }

        let rows = self
            .store
            .list_events(scope.organization_filter(), power_plant_id)
            .await?;
        Ok(rows.into_iter().map(PlantEventSummary::from).collect())
    }

    /// Best-effort recomputation hook. The event transition has already
    /// committed; a trigger failure is logged and swallowed.
    async fn notify_trigger(&self) {
        if let Err(e) = self.trigger.recompute_hourly_energy_data().await {
            tracing::warn!(error = %e, "hourly energy simulation trigger failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use crate::store::MemoryStore;
    use crate::trigger::TriggerError;
    use async_trait::async_trait;
    use market_client::domain::{NewOrganization, NewPowerPlant, STATUS_ACTIVE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use time::macros::datetime;

    #[derive(Clone, Default)]
    struct RecordingTrigger {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl RecordingTrigger {
        fn failing() -> Self {
            RecordingTrigger {
                calls: Arc::default(),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
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

    const NOW: OffsetDateTime = datetime!(2024-06-01 08:00:00 UTC);

    async fn seeded_store() -> (MemoryStore, i64, i64) {
        let store = MemoryStore::new();
        let org = store
            .insert_organization(NewOrganization {
                name: "acme".to_string(),
                eic: "ORG-1".to_string(),
            })
            .await
            .unwrap();
        let plant = store
            .insert_plant(NewPowerPlant {
                name: "river hydro".to_string(),
                eic: "PP-1".to_string(),
                installed_capacity: 100.0,
                fuel_type: "hydro".to_string(),
                is_yekdem: false,
                is_res: true,
                organization_id: org.id,
            })
            .await
            .unwrap();
        (store, org.id, plant.id)
    }

    fn admin(organization_id: i64) -> IdentityContext {
        IdentityContext {
            user_id: 10,
            role: Role::Admin,
            organization_id,
        }
    }

    fn analyst(organization_id: i64) -> IdentityContext {
        IdentityContext {
            user_id: 11,
            role: Role::Analyst,
            organization_id,
        }
    }

    #[tokio::test]
    async fn full_cycle_mirrors_plant_status() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store.clone(), RecordingTrigger::default());
        let caller = admin(org_id);

        let event_id = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();
        let plant = store.find_plant(plant_id).await.unwrap().unwrap();
        assert_eq!(plant.current_status, "Failure");

        lifecycle
            .finish(&caller, event_id, NOW + time::Duration::hours(4))
            .await
            .unwrap();
        let plant = store.find_plant(plant_id).await.unwrap().unwrap();
        assert_eq!(plant.current_status, STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn affected_capacity_above_installed_is_invalid() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());

        let err = lifecycle
            .start(
                &admin(org_id),
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                150.0,
                NOW,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn affected_capacity_equal_to_installed_is_accepted() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());

        lifecycle
            .start(
                &admin(org_id),
                plant_id,
                EventType::Maintenance,
                "full overhaul".to_string(),
                None,
                100.0,
                NOW,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_start_on_the_same_plant_conflicts() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());
        let caller = admin(org_id);

        lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();
        let err = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Maintenance,
                "inspection".to_string(),
                None,
                10.0,
                NOW,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn repeated_finish_conflicts() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());
        let caller = admin(org_id);

        let event_id = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();
        lifecycle.finish(&caller, event_id, NOW).await.unwrap();

        let err = lifecycle.finish(&caller, event_id, NOW).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn analyst_cannot_start_or_finish() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());
        let caller = admin(org_id);

        let event_id = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();

        let err = lifecycle
            .start(
                &analyst(org_id),
                plant_id,
                EventType::Maintenance,
                "inspection".to_string(),
                None,
                10.0,
                NOW,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        let err = lifecycle
            .finish(&analyst(org_id), event_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn cross_tenant_plant_reads_as_missing() {
        let (store, _, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());
        let outsider = admin(999);

        let cross = lifecycle
            .start(
                &outsider,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap_err();
        let missing = lifecycle
            .start(
                &outsider,
                424242,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap_err();
        assert!(matches!(cross, ServiceError::NotFound));
        assert!(matches!(missing, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn trigger_failure_is_swallowed_and_transition_persists() {
        let (store, org_id, plant_id) = seeded_store().await;
        let trigger = RecordingTrigger::failing();
        let lifecycle = EventLifecycle::new(store.clone(), trigger.clone());

        lifecycle
            .start(
                &admin(org_id),
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();

        assert_eq!(trigger.calls(), 1);
        let plant = store.find_plant(plant_id).await.unwrap().unwrap();
        assert_eq!(plant.current_status, "Failure");
    }

    #[tokio::test]
    async fn trigger_fires_once_per_transition() {
        let (store, org_id, plant_id) = seeded_store().await;
        let trigger = RecordingTrigger::default();
        let lifecycle = EventLifecycle::new(store, trigger.clone());
        let caller = admin(org_id);

        let event_id = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();
        lifecycle.finish(&caller, event_id, NOW).await.unwrap();

        assert_eq!(trigger.calls(), 2);
    }

    #[tokio::test]
    async fn listing_derives_continue_and_completed() {
        let (store, org_id, plant_id) = seeded_store().await;
        let lifecycle = EventLifecycle::new(store, RecordingTrigger::default());
        let caller = admin(org_id);

        let first = lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Failure,
                "turbine trip".to_string(),
                None,
                80.0,
                NOW,
            )
            .await
            .unwrap();
        lifecycle
            .finish(&caller, first, NOW + time::Duration::hours(1))
            .await
            .unwrap();
        lifecycle
            .start(
                &caller,
                plant_id,
                EventType::Maintenance,
                "inspection".to_string(),
                Some("annual".to_string()),
                20.0,
                NOW + time::Duration::hours(2),
            )
            .await
            .unwrap();

        let rows = lifecycle.list(&caller, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first: the open maintenance event leads.
        assert_eq!(rows[0].event_type, "Maintenance");
        assert_eq!(rows[0].status, "continue");
        assert_eq!(rows[1].event_type, "Failure");
        assert_eq!(rows[1].status, "completed");
    }
}
