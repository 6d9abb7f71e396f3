use serde::Serialize;

/// Status a plant reports when it has no open event.
pub const STATUS_ACTIVE: &str = "Active";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PowerPlant {
    pub id: i64,
    pub name: String,
    pub eic: String,
    pub installed_capacity: f64,
    pub fuel_type: String,
    pub is_yekdem: bool,
    pub is_res: bool,
    /// Mirrors the plant's open event type, or [`STATUS_ACTIVE`] if none.
    pub current_status: String,
    pub organization_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewPowerPlant {
    pub name: String,
    pub eic: String,
    pub installed_capacity: f64,
    pub fuel_type: String,
    pub is_yekdem: bool,
    pub is_res: bool,
    pub organization_id: i64,
}
