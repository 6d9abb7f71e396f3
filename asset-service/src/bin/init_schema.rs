use anyhow::Result;
use asset_service::{config::AppConfig, observability};
use sqlx::postgres::PgPoolOptions;

/// Table definitions for the market platform. The partial unique index on
/// `plant_events` backs the single-open-event invariant at the storage
/// layer, underneath the transactional check in the service.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS organizations (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        eic TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        credential TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        role TEXT NOT NULL,
        organization_id BIGINT NOT NULL REFERENCES organizations(id)
    )",
    "CREATE TABLE IF NOT EXISTS power_plants (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        eic TEXT NOT NULL UNIQUE,
        installed_capacity DOUBLE PRECISION NOT NULL,
        fuel_type TEXT NOT NULL,
        is_yekdem BOOLEAN NOT NULL DEFAULT FALSE,
        is_res BOOLEAN NOT NULL DEFAULT FALSE,
        current_status TEXT NOT NULL DEFAULT 'Active',
        organization_id BIGINT NOT NULL REFERENCES organizations(id)
    )",
    "CREATE TABLE IF NOT EXISTS generation_data (
        id BIGSERIAL PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL,
        actual_generation DOUBLE PRECISION NOT NULL,
        planned_generation DOUBLE PRECISION NOT NULL,
        settlement_generation DOUBLE PRECISION NOT NULL,
        power_plant_id BIGINT NOT NULL REFERENCES power_plants(id)
    )",
    "CREATE TABLE IF NOT EXISTS plant_events (
        id BIGSERIAL PRIMARY KEY,
        event_type TEXT NOT NULL,
        reason TEXT NOT NULL,
        description TEXT,
        affected_capacity DOUBLE PRECISION NOT NULL,
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ,
        power_plant_id BIGINT NOT NULL REFERENCES power_plants(id)
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS plant_events_one_open_per_plant
        ON plant_events (power_plant_id) WHERE end_time IS NULL",
    "CREATE TABLE IF NOT EXISTS market_prices (
        id BIGSERIAL PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL UNIQUE,
        price_ptf DOUBLE PRECISION NOT NULL,
        price_smf DOUBLE PRECISION NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS national_consumption (
        id BIGSERIAL PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL UNIQUE,
        actual_consumption DOUBLE PRECISION NOT NULL,
        demand_forecast DOUBLE PRECISION NOT NULL
    )",
];

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.url)
        .await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    tracing::info!("market schema is in place");
    Ok(())
}
