use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NationalConsumption {
    pub id: i64,
    pub timestamp: OffsetDateTime,
    pub actual_consumption: f64,
    pub demand_forecast: f64,
}

/// Metered consumption projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConsumptionPoint {
    pub timestamp: OffsetDateTime,
    pub actual_consumption: f64,
}

/// Forward-looking demand forecast projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ForecastPoint {
    pub timestamp: OffsetDateTime,
    pub demand_forecast: f64,
}
