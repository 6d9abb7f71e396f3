use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{ConsumptionPoint, ForecastPoint};

/// Fetch metered national consumption over an inclusive time range.
pub async fn actual_consumption_range(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<ConsumptionPoint>> {
    let rows = sqlx::query_as::<_, ConsumptionPoint>(
        r#"
        SELECT
            timestamp,
            actual_consumption
        FROM national_consumption
        WHERE timestamp >= $1
          AND timestamp <= $2
        ORDER BY timestamp
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch the demand forecast over an inclusive time range.
pub async fn demand_forecast_range(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<ForecastPoint>> {
    let rows = sqlx::query_as::<_, ForecastPoint>(
        r#"
        SELECT
            timestamp,
            demand_forecast
        FROM national_consumption
        WHERE timestamp >= $1
          AND timestamp <= $2
        ORDER BY timestamp
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
