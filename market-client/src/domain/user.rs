use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque credential token; never serialized back to callers.
    #[serde(skip_serializing)]
    pub credential: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub organization_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub credential: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub organization_id: i64,
}
