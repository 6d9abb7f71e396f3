//! Applies the authorization and time-window policies to feed queries
//! before they reach the data store.
//!
//! Order per request: pure capability gate, then the clamp (an Empty range
//! returns immediately, zero store reads), then validation of explicit
//! plant/organization filters, then one scoped, time-bounded query. Tenant
//! scoping and time clamping are independent filters, so applying them in
//! either order yields the same rows.

use market_client::domain::{
    ClearingPricePoint, ConsumptionPoint, ForecastPoint, GenerationRow, MarginalPricePoint,
};
use time::OffsetDateTime;

use crate::authz::{authorize, Action, ResourceScope, TenantScope};
use crate::error::ServiceError;
use crate::identity::IdentityContext;
use crate::store::DataStore;
use crate::window::{clamp, ClampedRange, FeedKind};

pub struct QueryScoper<S> {
    store: S,
}

impl<S: DataStore> QueryScoper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_realtime_consumption(
        &self,
        identity: &IdentityContext,
        start: OffsetDateTime,
        end: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Vec<ConsumptionPoint>, ServiceError> {
        authorize(identity, Action::ReadMarketFeed, ResourceScope::Any).into_scope()?;
        let (start, end) = match clamp(FeedKind::RealtimeConsumption, start, end, now) {
            ClampedRange::Empty => return Ok(Vec::new()),
            ClampedRange::Window { start, end } => (start, end),
        };
        Ok(self.store.consumption_range(start, end).await?)
    }

    pub async fn list_demand_forecast(
        &self,
        identity: &IdentityContext,
        start: OffsetDateTime,
        end: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Vec<ForecastPoint>, ServiceError> {
        authorize(identity, Action::ReadMarketFeed, ResourceScope::Any).into_scope()?;
        let (start, end) = match clamp(FeedKind::DemandForecast, start, end, now) {
            ClampedRange::Empty => return Ok(Vec::new()),
            ClampedRange::Window { start, end } => (start, end),
        };
        Ok(self.store.demand_forecast_range(start, end).await?)
    }

    pub async fn list_market_clearing_price(
        &self,
        identity: &IdentityContext,
        start: OffsetDateTime,
        end: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Vec<ClearingPricePoint>, ServiceError> {
        authorize(identity, Action::ReadMarketFeed, ResourceScope::Any).into_scope()?;
        let (start, end) = match clamp(FeedKind::MarketClearingPrice, start, end, now) {
            ClampedRange::Empty => return Ok(Vec::new()),
            ClampedRange::Window { start, end } => (start, end),
        };
        Ok(self.store.clearing_price_range(start, end).await?)
    }

    pub async fn list_system_marginal_price(
        &self,
        identity: &IdentityContext,
        start: OffsetDateTime,
        end: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Vec<MarginalPricePoint>, ServiceError> {
        authorize(identity, Action::ReadMarketFeed, ResourceScope::Any).into_scope()?;
        let (start, end) = match clamp(FeedKind::SystemMarginalPrice, start, end, now) {
            ClampedRange::Empty => return Ok(Vec::new()),
            ClampedRange::Window { start, end } => (start, end),
        };
        Ok(self.store.marginal_price_range(start, end).await?)
    }

    /// Generation rows joined with their plant, tenant-scoped and clamped
    /// to the previous day. Explicit plant/organization filters are
    /// validated against the caller's tenant before they are passed on.
    pub async fn list_realtime_generation(
        &self,
        identity: &IdentityContext,
        start: OffsetDateTime,
        end: OffsetDateTime,
        power_plant_id: Option<i64>,
        organization_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<Vec<GenerationRow>, ServiceError> {
        let scope = authorize(identity, Action::ListGeneration, ResourceScope::Any).into_scope()?;

        let (start, end) = match clamp(FeedKind::RealtimeGeneration, start, end, now) {
            ClampedRange::Empty => return Ok(Vec::new()),
            ClampedRange::Window { start, end } => (start, end),
        };

        if let Some(plant_id) = power_plant_id {
            let resource = match self.store.find_plant(plant_id).await? {
                None => ResourceScope::Missing,
                Some(plant) => ResourceScope::OwnedBy(plant.organization_id),
            };
            authorize(identity, Action::ViewPlant, resource).into_scope()?;
        }
        if let Some(org) = organization_id {
            authorize(identity, Action::ListGeneration, ResourceScope::OwnedBy(org))
                .into_scope()?;
        }

        let org_filter = match scope {
            TenantScope::Unrestricted => organization_id,
            TenantScope::RestrictedTo(org) => Some(org),
        };

        Ok(self
            .store
            .generation_range(start, end, org_filter, power_plant_id)
            .await?)
    }
}
