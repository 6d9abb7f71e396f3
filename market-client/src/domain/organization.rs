use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub eic: String,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a new organization; `id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub eic: String,
}
