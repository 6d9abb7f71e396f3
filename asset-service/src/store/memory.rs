//! In-memory [`DataStore`] used by the test suites. A single mutex
//! serializes every operation, which makes `begin_event` naturally atomic,
//! and a feed-read counter lets tests assert that clamped-empty queries
//! never reach the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use market_client::domain::{
    ClearingPricePoint, ConsumptionPoint, ForecastPoint, GenerationData, GenerationRow,
    MarginalPricePoint, MarketPrice, NationalConsumption, NewOrganization, NewPlantEvent,
    NewPowerPlant, NewUser, Organization, PlantEvent, PlantEventDetail, PowerPlant, User,
    STATUS_ACTIVE,
};
use time::OffsetDateTime;

use super::{DataStore, StoreError};

#[derive(Default)]
struct State {
    organizations: Vec<Organization>,
    users: Vec<User>,
    plants: Vec<PowerPlant>,
    events: Vec<PlantEvent>,
    generation: Vec<GenerationData>,
    market_prices: Vec<MarketPrice>,
    consumption: Vec<NationalConsumption>,
    next_id: i64,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    feed_reads: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().expect("memory store mutex poisoned")
    }

    fn record_feed_read(&self) {
        self.inner.feed_reads.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of feed range queries served so far.
    pub fn feed_reads(&self) -> usize {
        self.inner.feed_reads.load(Ordering::SeqCst)
    }

    pub fn seed_market_price(&self, timestamp: OffsetDateTime, price_ptf: f64, price_smf: f64) {
        let mut state = self.state();
        let id = state.allocate_id();
        state.market_prices.push(MarketPrice {
            id,
            timestamp,
            price_ptf,
            price_smf,
        });
    }

    pub fn seed_consumption(
        &self,
        timestamp: OffsetDateTime,
        actual_consumption: f64,
        demand_forecast: f64,
    ) {
        let mut state = self.state();
        let id = state.allocate_id();
        state.consumption.push(NationalConsumption {
            id,
            timestamp,
            actual_consumption,
            demand_forecast,
        });
    }

    pub fn seed_generation(
        &self,
        power_plant_id: i64,
        timestamp: OffsetDateTime,
        actual_generation: f64,
        planned_generation: f64,
        settlement_generation: f64,
    ) {
        let mut state = self.state();
        let id = state.allocate_id();
        state.generation.push(GenerationData {
            id,
            timestamp,
            actual_generation,
            planned_generation,
            settlement_generation,
            power_plant_id,
        });
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let mut state = self.state();
        if state
            .organizations
            .iter()
            .any(|o| o.name == new.name || o.eic == new.eic)
        {
            return Err(StoreError::Duplicate("organization"));
        }
        let id = state.allocate_id();
        let organization = Organization {
            id,
            name: new.name,
            eic: new.eic,
            created_at: OffsetDateTime::now_utc(),
        };
        state.organizations.push(organization.clone());
        Ok(organization)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(self.state().organizations.clone())
    }

    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, StoreError> {
        Ok(self
            .state()
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError> {
        Ok(self
            .state()
            .organizations
            .iter()
            .find(|o| o.name == name)
            .cloned())
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Duplicate("user"));
        }
        let id = state.allocate_id();
        let user = User {
            id,
            username: new.username,
            credential: new.credential,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            role: new.role,
            organization_id: new.organization_id,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.state().users.clone())
    }

    async fn find_user_by_credential(&self, credential: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.credential == credential)
            .cloned())
    }

    async fn insert_plant(&self, new: NewPowerPlant) -> Result<PowerPlant, StoreError> {
        let mut state = self.state();
        if state.plants.iter().any(|p| p.eic == new.eic) {
            return Err(StoreError::Duplicate("power plant"));
        }
        let id = state.allocate_id();
        let plant = PowerPlant {
            id,
            name: new.name,
            eic: new.eic,
            installed_capacity: new.installed_capacity,
            fuel_type: new.fuel_type,
            is_yekdem: new.is_yekdem,
            is_res: new.is_res,
            current_status: STATUS_ACTIVE.to_string(),
            organization_id: new.organization_id,
        };
        state.plants.push(plant.clone());
        Ok(plant)
    }

    async fn list_plants(
        &self,
        organization_id: Option<i64>,
    ) -> Result<Vec<PowerPlant>, StoreError> {
        let state = self.state();
        Ok(state
            .plants
            .iter()
            .filter(|p| organization_id.is_none_or(|org| p.organization_id == org))
            .cloned()
            .collect())
    }

    async fn find_plant(&self, id: i64) -> Result<Option<PowerPlant>, StoreError> {
        Ok(self.state().plants.iter().find(|p| p.id == id).cloned())
    }

    async fn begin_event(&self, new: NewPlantEvent) -> Result<PlantEvent, StoreError> {
        let mut state = self.state();
        if !state.plants.iter().any(|p| p.id == new.power_plant_id) {
            return Err(StoreError::Database(format!(
                "power plant {} does not exist",
                new.power_plant_id
            )));
        }
        if state
            .events
            .iter()
            .any(|e| e.power_plant_id == new.power_plant_id && e.end_time.is_none())
        {
            return Err(StoreError::OpenEvent(new.power_plant_id));
        }
        let id = state.allocate_id();
        let event = PlantEvent {
            id,
            event_type: new.event_type.clone(),
            reason: new.reason,
            description: new.description,
            affected_capacity: new.affected_capacity,
            start_time: new.start_time,
            end_time: None,
            power_plant_id: new.power_plant_id,
        };
        state.events.push(event.clone());
        if let Some(plant) = state
            .plants
            .iter_mut()
            .find(|p| p.id == new.power_plant_id)
        {
            plant.current_status = new.event_type;
        }
        Ok(event)
    }

    async fn conclude_event(
        &self,
        event_id: i64,
        end_time: OffsetDateTime,
    ) -> Result<PlantEvent, StoreError> {
        let mut state = self.state();
        let Some(event) = state.events.iter_mut().find(|e| e.id == event_id) else {
            return Err(StoreError::Database(format!(
                "plant event {event_id} does not exist"
            )));
        };
        if event.end_time.is_some() {
            return Err(StoreError::Concluded(event_id));
        }
        event.end_time = Some(end_time);
        let event = event.clone();
        if let Some(plant) = state
            .plants
            .iter_mut()
            .find(|p| p.id == event.power_plant_id)
        {
            plant.current_status = STATUS_ACTIVE.to_string();
        }
        Ok(event)
    }

    async fn find_event(&self, id: i64) -> Result<Option<PlantEvent>, StoreError> {
        Ok(self.state().events.iter().find(|e| e.id == id).cloned())
    }

    async fn find_open_event(
        &self,
        power_plant_id: i64,
    ) -> Result<Option<PlantEvent>, StoreError> {
        Ok(self
            .state()
            .events
            .iter()
            .find(|e| e.power_plant_id == power_plant_id && e.end_time.is_none())
            .cloned())
    }

    async fn list_events(
        &self,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<PlantEventDetail>, StoreError> {
        let state = self.state();
        let mut rows: Vec<PlantEventDetail> = state
            .events
            .iter()
            .filter(|e| power_plant_id.is_none_or(|plant| e.power_plant_id == plant))
            .filter_map(|e| {
                let plant = state.plants.iter().find(|p| p.id == e.power_plant_id)?;
                if organization_id.is_some_and(|org| plant.organization_id != org) {
                    return None;
                }
                Some(PlantEventDetail {
                    id: e.id,
                    plant_name: plant.name.clone(),
                    event_type: e.event_type.clone(),
                    reason: e.reason.clone(),
                    description: e.description.clone(),
                    affected_capacity: e.affected_capacity,
                    start_time: e.start_time,
                    end_time: e.end_time,
                    power_plant_id: e.power_plant_id,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(rows)
    }

    async fn consumption_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ConsumptionPoint>, StoreError> {
        self.record_feed_read();
        let state = self.state();
        let mut rows: Vec<ConsumptionPoint> = state
            .consumption
            .iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .map(|c| ConsumptionPoint {
                timestamp: c.timestamp,
                actual_consumption: c.actual_consumption,
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn demand_forecast_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ForecastPoint>, StoreError> {
        self.record_feed_read();
        let state = self.state();
        let mut rows: Vec<ForecastPoint> = state
            .consumption
            .iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .map(|c| ForecastPoint {
                timestamp: c.timestamp,
                demand_forecast: c.demand_forecast,
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn clearing_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ClearingPricePoint>, StoreError> {
        self.record_feed_read();
        let state = self.state();
        let mut rows: Vec<ClearingPricePoint> = state
            .market_prices
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .map(|m| ClearingPricePoint {
                timestamp: m.timestamp,
                price_ptf: m.price_ptf,
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn marginal_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<MarginalPricePoint>, StoreError> {
        self.record_feed_read();
        let state = self.state();
        let mut rows: Vec<MarginalPricePoint> = state
            .market_prices
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .map(|m| MarginalPricePoint {
                timestamp: m.timestamp,
                price_smf: m.price_smf,
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn generation_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<GenerationRow>, StoreError> {
        self.record_feed_read();
        let state = self.state();
        let mut rows: Vec<GenerationRow> = state
            .generation
            .iter()
            .filter(|g| g.timestamp >= start && g.timestamp <= end)
            .filter(|g| power_plant_id.is_none_or(|plant| g.power_plant_id == plant))
            .filter_map(|g| {
                let plant = state.plants.iter().find(|p| p.id == g.power_plant_id)?;
                if organization_id.is_some_and(|org| plant.organization_id != org) {
                    return None;
                }
                Some(GenerationRow {
                    timestamp: g.timestamp,
                    plant_name: plant.name.clone(),
                    eic: plant.eic.clone(),
                    fuel_type: plant.fuel_type.clone(),
                    actual_generation: g.actual_generation,
                    planned_generation: g.planned_generation,
                    settlement_generation: g.settlement_generation,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn new_org(name: &str, eic: &str) -> NewOrganization {
        NewOrganization {
            name: name.to_string(),
            eic: eic.to_string(),
        }
    }

    fn new_plant(eic: &str, organization_id: i64) -> NewPowerPlant {
        NewPowerPlant {
            name: format!("plant-{eic}"),
            eic: eic.to_string(),
            installed_capacity: 100.0,
            fuel_type: "hydro".to_string(),
            is_yekdem: false,
            is_res: false,
            organization_id,
        }
    }

    fn new_event(power_plant_id: i64, start_time: OffsetDateTime) -> NewPlantEvent {
        NewPlantEvent {
            power_plant_id,
            event_type: "Failure".to_string(),
            reason: "turbine trip".to_string(),
            description: None,
            affected_capacity: 40.0,
            start_time,
        }
    }

    #[tokio::test]
    async fn begin_event_rejects_a_second_open_event() {
        let store = MemoryStore::new();
        let org = store.insert_organization(new_org("acme", "ORG-1")).await.unwrap();
        let plant = store.insert_plant(new_plant("PP-1", org.id)).await.unwrap();

        let start = datetime!(2024-06-01 08:00:00 UTC);
        store.begin_event(new_event(plant.id, start)).await.unwrap();

        let second = store.begin_event(new_event(plant.id, start)).await;
        assert!(matches!(second, Err(StoreError::OpenEvent(id)) if id == plant.id));
    }

    #[tokio::test]
    async fn conclude_event_twice_reports_concluded() {
        let store = MemoryStore::new();
        let org = store.insert_organization(new_org("acme", "ORG-1")).await.unwrap();
        let plant = store.insert_plant(new_plant("PP-1", org.id)).await.unwrap();

        let start = datetime!(2024-06-01 08:00:00 UTC);
        let event = store.begin_event(new_event(plant.id, start)).await.unwrap();

        let end = datetime!(2024-06-01 12:00:00 UTC);
        store.conclude_event(event.id, end).await.unwrap();

        let again = store.conclude_event(event.id, end).await;
        assert!(matches!(again, Err(StoreError::Concluded(id)) if id == event.id));
    }

    #[tokio::test]
    async fn list_events_orders_newest_first() {
        let store = MemoryStore::new();
        let org = store.insert_organization(new_org("acme", "ORG-1")).await.unwrap();
        let plant_a = store.insert_plant(new_plant("PP-1", org.id)).await.unwrap();
        let plant_b = store.insert_plant(new_plant("PP-2", org.id)).await.unwrap();

        let older = store
            .begin_event(new_event(plant_a.id, datetime!(2024-06-01 08:00:00 UTC)))
            .await
            .unwrap();
        let newer = store
            .begin_event(new_event(plant_b.id, datetime!(2024-06-02 08:00:00 UTC)))
            .await
            .unwrap();

        let rows = store.list_events(None, None).await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
    }
}
