pub mod assets;
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod scoper;
pub mod store;
pub mod trigger;
pub mod window;

pub use error::ServiceError;
pub use identity::{IdentityContext, Role};
