use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GenerationData {
    pub id: i64,
    pub timestamp: OffsetDateTime,
    pub actual_generation: f64,
    pub planned_generation: f64,
    pub settlement_generation: f64,
    pub power_plant_id: i64,
}

/// Generation measurement joined with its plant, as exposed to callers.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GenerationRow {
    pub timestamp: OffsetDateTime,
    pub plant_name: String,
    pub eic: String,
    pub fuel_type: String,
    pub actual_generation: f64,
    pub planned_generation: f64,
    pub settlement_generation: f64,
}
