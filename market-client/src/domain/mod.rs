pub mod consumption;
pub mod generation;
pub mod market;
pub mod organization;
pub mod plant_event;
pub mod power_plant;
pub mod user;

pub use consumption::{ConsumptionPoint, ForecastPoint, NationalConsumption};
pub use generation::{GenerationData, GenerationRow};
pub use market::{ClearingPricePoint, MarginalPricePoint, MarketPrice};
pub use organization::{NewOrganization, Organization};
pub use plant_event::{NewPlantEvent, PlantEvent, PlantEventDetail};
pub use power_plant::{NewPowerPlant, PowerPlant, STATUS_ACTIVE};
pub use user::{NewUser, User};
