//! Downstream recomputation of derived hourly energy data. Invoked
//! best-effort after an event transition commits; never retried, never
//! allowed to undo the transition it follows.

use async_trait::async_trait;
use sqlx::PgPool;

#[derive(thiserror::Error, Debug)]
#[error("simulation trigger failed: {0}")]
pub struct TriggerError(pub String);

#[async_trait]
pub trait SimulationTrigger: Send + Sync {
    /// One bounded, non-retrying recomputation attempt.
    async fn recompute_hourly_energy_data(&self) -> Result<(), TriggerError>;
}

/// Runs the `simulate_hourly_energy_data()` routine installed alongside the
/// market schema.
#[derive(Clone)]
pub struct PgSimulationTrigger {
    pool: PgPool,
}

impl PgSimulationTrigger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SimulationTrigger for PgSimulationTrigger {
    async fn recompute_hourly_energy_data(&self) -> Result<(), TriggerError> {
        sqlx::query("SELECT simulate_hourly_energy_data()")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| TriggerError(e.to_string()))
    }
}

/// Trigger for deployments without the simulation routine installed.
#[derive(Clone, Default)]
pub struct NoopTrigger;

#[async_trait]
impl SimulationTrigger for NoopTrigger {
    async fn recompute_hourly_energy_data(&self) -> Result<(), TriggerError> {
        tracing::debug!("simulation trigger disabled; skipping recomputation");
        Ok(())
    }
}
