use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{ClearingPricePoint, MarginalPricePoint};

/// Fetch market clearing prices (PTF) over an inclusive time range.
pub async fn clearing_price_range(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<ClearingPricePoint>> {
    let rows = sqlx::query_as::<_, ClearingPricePoint>(
        r#"
        SELECT
            timestamp,
            price_ptf
        FROM market_prices
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

/// Fetch system marginal prices (SMF) over an inclusive time range.
pub async fn marginal_price_range(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<MarginalPricePoint>> {
    let rows = sqlx::query_as::<_, MarginalPricePoint>(
        r#"
        SELECT
            timestamp,
            price_smf
        FROM market_prices
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
