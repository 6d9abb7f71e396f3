use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MarketPrice {
    pub id: i64,
    pub timestamp: OffsetDateTime,
    pub price_ptf: f64,
    pub price_smf: f64,
}

/// Market clearing price (PTF) projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClearingPricePoint {
    pub timestamp: OffsetDateTime,
    pub price_ptf: f64,
}

/// System marginal price (SMF) projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MarginalPricePoint {
    pub timestamp: OffsetDateTime,
    pub price_smf: f64,
}
