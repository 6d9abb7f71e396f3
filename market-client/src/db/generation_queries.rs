use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::domain::GenerationRow;

/// Fetch generation measurements joined with their plant over an inclusive
/// time range, optionally narrowed to one organization and/or one plant.
pub async fn generation_range(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
    organization_id: Option<i64>,
    power_plant_id: Option<i64>,
) -> Result<Vec<GenerationRow>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        r#"
        SELECT
            g.timestamp,
            p.name AS plant_name,
            p.eic,
            p.fuel_type,
            g.actual_generation,
            g.planned_generation,
            g.settlement_generation
        FROM generation_data g
        JOIN power_plants p ON g.power_plant_id = p.id
        WHERE g.timestamp >= "#,
    );
    builder.push_bind(start);
    builder.push(" AND g.timestamp <= ");
    builder.push_bind(end);

    if let Some(org) = organization_id {
        builder.push(" AND p.organization_id = ");
        builder.push_bind(org);
    }
    if let Some(plant) = power_plant_id {
        builder.push(" AND g.power_plant_id = ");
        builder.push_bind(plant);
    }

    builder.push(" ORDER BY g.timestamp");

    let rows = builder
        .build_query_as::<GenerationRow>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
