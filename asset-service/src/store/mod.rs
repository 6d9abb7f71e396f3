//! Persistence seam. All mutable state lives behind [`DataStore`]; the
//! policy and lifecycle layers only hold transient views and decisions.

use async_trait::async_trait;
use market_client::domain::{
    ClearingPricePoint, ConsumptionPoint, ForecastPoint, GenerationRow, MarginalPricePoint,
    NewOrganization, NewPlantEvent, NewPowerPlant, NewUser, Organization, PlantEvent,
    PlantEventDetail, PowerPlant, User,
};
use time::OffsetDateTime;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("plant {0} already has an open event")]
    OpenEvent(i64),
    #[error("event {0} is already concluded")]
    Concluded(i64),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError>;
    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError>;
    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, StoreError>;
    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError>;

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn find_user_by_credential(&self, credential: &str) -> Result<Option<User>, StoreError>;

    async fn insert_plant(&self, new: NewPowerPlant) -> Result<PowerPlant, StoreError>;
    async fn list_plants(
        &self,
        organization_id: Option<i64>,
    ) -> Result<Vec<PowerPlant>, StoreError>;
    async fn find_plant(&self, id: i64) -> Result<Option<PowerPlant>, StoreError>;

    /// Atomically insert an open event and mirror the plant status to its
    /// type. Fails with [`StoreError::OpenEvent`] when the plant already has
    /// an open event; concurrent callers racing on one plant serialize here.
    async fn begin_event(&self, new: NewPlantEvent) -> Result<PlantEvent, StoreError>;
    /// Atomically set `end_time` and reset the plant status to Active.
    /// Fails with [`StoreError::Concluded`] when the event already ended.
    async fn conclude_event(
        &self,
        event_id: i64,
        end_time: OffsetDateTime,
    ) -> Result<PlantEvent, StoreError>;
    async fn find_event(&self, id: i64) -> Result<Option<PlantEvent>, StoreError>;
    async fn find_open_event(&self, power_plant_id: i64)
        -> Result<Option<PlantEvent>, StoreError>;
    /// Events joined with their plant name, newest `start_time` first.
    async fn list_events(
        &self,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<PlantEventDetail>, StoreError>;

    async fn consumption_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ConsumptionPoint>, StoreError>;
    async fn demand_forecast_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ForecastPoint>, StoreError>;
    async fn clearing_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ClearingPricePoint>, StoreError>;
    async fn marginal_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<MarginalPricePoint>, StoreError>;
    async fn generation_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<GenerationRow>, StoreError>;
}
