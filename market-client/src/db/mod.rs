pub mod consumption_queries;
pub mod generation_queries;
pub mod market_queries;
