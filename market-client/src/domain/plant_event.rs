use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlantEvent {
    pub id: i64,
    pub event_type: String,
    pub reason: String,
    pub description: Option<String>,
    pub affected_capacity: f64,
    pub start_time: OffsetDateTime,
    /// `None` while the event is still open.
    pub end_time: Option<OffsetDateTime>,
    pub power_plant_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewPlantEvent {
    pub power_plant_id: i64,
    pub event_type: String,
    pub reason: String,
    pub description: Option<String>,
    pub affected_capacity: f64,
    pub start_time: OffsetDateTime,
}

/// Event joined with its plant's display name for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlantEventDetail {
    pub id: i64,
    pub plant_name: String,
    pub event_type: String,
    pub reason: String,
    pub description: Option<String>,
    pub affected_capacity: f64,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub power_plant_id: i64,
}
