//! Postgres-backed [`DataStore`]. Feed range reads delegate to the shared
//! query helpers in `market-client`; event transitions run in a transaction
//! that locks the plant row so concurrent starts serialize on one winner.

use async_trait::async_trait;
use market_client::db::{consumption_queries, generation_queries, market_queries};
use market_client::domain::{
    ClearingPricePoint, ConsumptionPoint, ForecastPoint, GenerationRow, MarginalPricePoint,
    NewOrganization, NewPlantEvent, NewPowerPlant, NewUser, Organization, PlantEvent,
    PlantEventDetail, PowerPlant, User, STATUS_ACTIVE,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use super::{DataStore, StoreError};

const PLANT_EVENT_COLUMNS: &str =
    "id, event_type, reason, description, affected_capacity, start_time, end_time, power_plant_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn map_duplicate(err: sqlx::Error, what: &'static str) -> StoreError {
    if unique_violation(&err) {
        StoreError::Duplicate(what)
    } else {
        err.into()
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (name, eic) VALUES ($1, $2) \
             RETURNING id, name, eic, created_at",
        )
        .bind(&new.name)
        .bind(&new.eic)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "organization"))
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let rows = sqlx::query_as::<_, Organization>(
            "SELECT id, name, eic, created_at FROM organizations ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query_as::<_, Organization>(
            "SELECT id, name, eic, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query_as::<_, Organization>(
            "SELECT id, name, eic, created_at FROM organizations WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users \
             (username, credential, first_name, last_name, email, role, organization_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, username, credential, first_name, last_name, email, role, organization_id",
        )
        .bind(&new.username)
        .bind(&new.credential)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.role)
        .bind(new.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "user"))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(
            "SELECT id, username, credential, first_name, last_name, email, role, organization_id \
             FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_user_by_credential(&self, credential: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, credential, first_name, last_name, email, role, organization_id \
             FROM users WHERE credential = $1",
        )
        .bind(credential)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_plant(&self, new: NewPowerPlant) -> Result<PowerPlant, StoreError> {
        sqlx::query_as::<_, PowerPlant>(
            "INSERT INTO power_plants \
             (name, eic, installed_capacity, fuel_type, is_yekdem, is_res, current_status, organization_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, name, eic, installed_capacity, fuel_type, is_yekdem, is_res, current_status, organization_id",
        )
        .bind(&new.name)
        .bind(&new.eic)
        .bind(new.installed_capacity)
        .bind(&new.fuel_type)
        .bind(new.is_yekdem)
        .bind(new.is_res)
        .bind(STATUS_ACTIVE)
        .bind(new.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "power plant"))
    }

    async fn list_plants(
        &self,
        organization_id: Option<i64>,
    ) -> Result<Vec<PowerPlant>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, name, eic, installed_capacity, fuel_type, is_yekdem, is_res, current_status, organization_id \
             FROM power_plants",
        );
        if let Some(org) = organization_id {
            builder.push(" WHERE organization_id = ");
            builder.push_bind(org);
        }
        builder.push(" ORDER BY id");

        let rows = builder
            .build_query_as::<PowerPlant>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_plant(&self, id: i64) -> Result<Option<PowerPlant>, StoreError> {
        let row = sqlx::query_as::<_, PowerPlant>(
            "SELECT id, name, eic, installed_capacity, fuel_type, is_yekdem, is_res, current_status, organization_id \
             FROM power_plants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn begin_event(&self, new: NewPlantEvent) -> Result<PlantEvent, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the plant row; a dropped transaction rolls everything back.
        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM power_plants WHERE id = $1 FOR UPDATE",
        )
        .bind(new.power_plant_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(StoreError::Database(format!(
                "power plant {} does not exist",
                new.power_plant_id
            )));
        }

        let open = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM plant_events WHERE power_plant_id = $1 AND end_time IS NULL",
        )
        .bind(new.power_plant_id)
        .fetch_optional(&mut *tx)
        .await?;
        if open.is_some() {
            return Err(StoreError::OpenEvent(new.power_plant_id));
        }

        let event = sqlx::query_as::<_, PlantEvent>(&format!(
            "INSERT INTO plant_events \
             (event_type, reason, description, affected_capacity, start_time, end_time, power_plant_id) \
             VALUES ($1, $2, $3, $4, $5, NULL, $6) \
             RETURNING {PLANT_EVENT_COLUMNS}"
        ))
        .bind(&new.event_type)
        .bind(&new.reason)
        .bind(&new.description)
        .bind(new.affected_capacity)
        .bind(new.start_time)
        .bind(new.power_plant_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // The partial unique index backs up the in-transaction check.
            if unique_violation(&e) {
                StoreError::OpenEvent(new.power_plant_id)
            } else {
                e.into()
            }
        })?;

        sqlx::query("UPDATE power_plants SET current_status = $1 WHERE id = $2")
            .bind(&new.event_type)
            .bind(new.power_plant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(event)
    }

    async fn conclude_event(
        &self,
        event_id: i64,
        end_time: OffsetDateTime,
    ) -> Result<PlantEvent, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, PlantEvent>(&format!(
            "UPDATE plant_events SET end_time = $1 \
             WHERE id = $2 AND end_time IS NULL \
             RETURNING {PLANT_EVENT_COLUMNS}"
        ))
        .bind(end_time)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = updated else {
            let exists =
                sqlx::query_scalar::<_, i64>("SELECT id FROM plant_events WHERE id = $1")
                    .bind(event_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => StoreError::Concluded(event_id),
                None => {
                    StoreError::Database(format!("plant event {event_id} does not exist"))
                }
            });
        };

        sqlx::query("UPDATE power_plants SET current_status = $1 WHERE id = $2")
            .bind(STATUS_ACTIVE)
            .bind(event.power_plant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(event)
    }

    async fn find_event(&self, id: i64) -> Result<Option<PlantEvent>, StoreError> {
        let row = sqlx::query_as::<_, PlantEvent>(&format!(
            "SELECT {PLANT_EVENT_COLUMNS} FROM plant_events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_open_event(
        &self,
        power_plant_id: i64,
    ) -> Result<Option<PlantEvent>, StoreError> {
        let row = sqlx::query_as::<_, PlantEvent>(&format!(
            "SELECT {PLANT_EVENT_COLUMNS} FROM plant_events \
             WHERE power_plant_id = $1 AND end_time IS NULL"
        ))
        .bind(power_plant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_events(
        &self,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<PlantEventDetail>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT e.id, p.name AS plant_name, e.event_type, e.reason, e.description, \
             e.affected_capacity, e.start_time, e.end_time, e.power_plant_id \
             FROM plant_events e \
             JOIN power_plants p ON e.power_plant_id = p.id \
             WHERE TRUE",
        );
        if let Some(org) = organization_id {
            builder.push(" AND p.organization_id = ");
            builder.push_bind(org);
        }
        if let Some(plant) = power_plant_id {
            builder.push(" AND e.power_plant_id = ");
            builder.push_bind(plant);
        }
        builder.push(" ORDER BY e.start_time DESC");

        let rows = builder
            .build_query_as::<PlantEventDetail>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn consumption_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ConsumptionPoint>, StoreError> {
        consumption_queries::actual_consumption_range(&self.pool, start, end)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn demand_forecast_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ForecastPoint>, StoreError> {
        consumption_queries::demand_forecast_range(&self.pool, start, end)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn clearing_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ClearingPricePoint>, StoreError> {
        market_queries::clearing_price_range(&self.pool, start, end)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn marginal_price_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<MarginalPricePoint>, StoreError> {
        market_queries::marginal_price_range(&self.pool, start, end)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn generation_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        organization_id: Option<i64>,
        power_plant_id: Option<i64>,
    ) -> Result<Vec<GenerationRow>, StoreError> {
        generation_queries::generation_range(&self.pool, start, end, organization_id, power_plant_id)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
